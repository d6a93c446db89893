//! The entity query engine.
//!
//! This crate turns model metadata plus JSON payloads into storage operations:
//!
//! - [`split`] separates an incoming payload into scalar columns, relation
//!   aliases, and nested component fields.
//! - [`validate`] checks nested-field shapes against the model and produces
//!   typed [`ComponentValue`](contentmodel_core::ComponentValue)s.
//! - [`components`] persists component instances through the polymorphic join
//!   table and reconciles them on update.
//! - [`service`] is the public CRUD surface, orchestrating transactions over a
//!   [`Backend`](contentmodel_core::Backend) and delegating relation links to
//!   a [`RelationHandler`](contentmodel_core::RelationHandler).
//!
//! The engine never renders SQL itself; backends receive structured queries.

/// Unwrap a `Result`, converting the error into `Outcome::Err`.
macro_rules! try_result {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return ::asupersync::Outcome::Err(e),
        }
    };
}
pub(crate) use try_result;

pub mod components;
pub mod service;
pub mod split;
pub mod validate;

pub use components::{
    COMPONENT_ID_COLUMN, COMPONENT_TYPE_COLUMN, FIELD_COLUMN, ORDER_COLUMN, create_components,
    delete_components, load_components, update_components,
};
pub use service::{Deleted, EntityService};
pub use split::{pick_relations, select_attributes};
pub use validate::validate_nested;
