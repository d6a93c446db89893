//! Core types and traits for contentmodel.
//!
//! `contentmodel-core` is the **foundation layer** for the entire workspace. It defines
//! the data model and the traits every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `StoreOps`, `Backend`, and `TransactionOps` are implemented by
//!   storage backends; `RelationHandler` by relation-persistence collaborators.
//! - **Data model**: `Row`, `Value`, and `Document` represent query inputs/outputs and
//!   are shared across the query, engine, and backend crates.
//! - **Schema metadata**: `ModelDef` and `ModelRegistry` describe runtime-defined
//!   content models — attributes, nested components, dynamic zones, associations.
//! - **Structured concurrency**: re-exports `Cx` and `Outcome` from asupersync so every
//!   async storage operation is cancel-correct.
//!
//! # Who Uses This Crate
//!
//! - `contentmodel-query` consumes `Query`, `Predicate`, and `Value` to translate
//!   filter parameters and render SQL.
//! - `contentmodel-engine` drives CRUD through `Backend` and `RelationHandler` using
//!   `ModelRegistry` metadata.
//! - Backend crates (`contentmodel-memory`, external drivers) implement `Backend` and
//!   operate on `Row`/`Value`.
//!
//! Most applications should use the `contentmodel` facade; reach for
//! `contentmodel-core` directly when writing backends or advanced integrations.

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod association;
pub mod error;
pub mod model;
pub mod payload;
pub mod query;
pub mod relations;
pub mod row;
pub mod store;
pub mod value;

pub use association::{AssociationDef, AssociationNature};
pub use error::{Error, Result};
pub use model::{
    AttributeDef, AttributeKind, ComponentAttr, DynamicZoneAttr, JoinTable, ModelDef,
    ModelRegistry, ScalarKind,
};
pub use payload::{COMPONENT_KEY, ComponentValue, Document, ZoneEntry, row_to_document, supplied_id};
pub use query::{CompareOp, Dialect, Predicate, Query, SortOrder};
pub use relations::RelationHandler;
pub use row::{FromValue, Row};
pub use store::{Backend, StoreOps, TransactionOps};
pub use value::Value;

/// Propagate an [`Outcome`], unwrapping the `Ok` value.
///
/// The non-`Ok` arms (`Err`, `Cancelled`, `Panicked`) are returned to the caller
/// unchanged, mirroring how every layer of the call graph forwards them.
#[macro_export]
macro_rules! try_outcome {
    ($expr:expr) => {
        match $expr {
            ::asupersync::Outcome::Ok(v) => v,
            ::asupersync::Outcome::Err(e) => return ::asupersync::Outcome::Err(e),
            ::asupersync::Outcome::Cancelled(r) => return ::asupersync::Outcome::Cancelled(r),
            ::asupersync::Outcome::Panicked(p) => return ::asupersync::Outcome::Panicked(p),
        }
    };
}
