//! Error taxonomy for contentmodel operations.
//!
//! Errors carry a machine-checkable status code (`status()`) alongside a
//! human-readable message naming the offending field. Backend failures are
//! propagated unchanged; no retries happen at this layer.

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type shared by every contentmodel crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The targeted entry does not exist (404-equivalent).
    #[error("entry not found in {model}")]
    NotFound {
        /// Model uid the lookup ran against.
        model: String,
    },

    /// A nested component/dynamic-zone payload failed structural validation
    /// (400-equivalent): wrong shape, missing required field, count out of
    /// bounds, missing or disallowed discriminant.
    #[error("invalid field {field}: {message}")]
    Validation {
        /// The offending attribute name.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// A supplied component instance id is not linked to the target entity
    /// (400-equivalent referential-integrity violation).
    #[error("field {field}: {message}")]
    Relation {
        /// The offending attribute name.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// Any lower-level storage failure, propagated unchanged.
    #[error("backend failure: {message}")]
    Backend {
        /// Driver-reported description.
        message: String,
    },
}

impl Error {
    /// Entry-not-found error for the given model uid.
    pub fn not_found(model: impl Into<String>) -> Self {
        Error::NotFound {
            model: model.into(),
        }
    }

    /// Structural-validation failure naming the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Referential-integrity failure naming the offending field.
    pub fn relation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Relation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Lower-level storage failure.
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }

    /// HTTP-equivalent status code for this error class.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation { .. } | Error::Relation { .. } => 400,
            Error::Backend { .. } => 500,
        }
    }
}
