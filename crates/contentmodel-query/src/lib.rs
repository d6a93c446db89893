//! Filter translation and SQL rendering for contentmodel.
//!
//! This crate is the bridge between REST-style query parameters and the
//! backend-agnostic [`Query`](contentmodel_core::Query) description:
//!
//! - [`params`] parses pagination, sort, and nested filter operators.
//! - [`search`] builds the free-text search predicate over a model's
//!   searchable attributes.
//! - [`sql`] renders a `Query` to SQL per backend dialect, including the
//!   dialect-dispatched full-text forms.
//!
//! Execution is not this crate's concern; backends receive either the
//! structured `Query` or the rendered SQL, depending on their kind.

pub mod params;
pub mod search;
pub mod sql;

pub use params::{Filter, FilterParams};
pub use search::{search_predicate, search_query};
pub use sql::{count_sql, quote_ident, quote_ident_mysql, to_sql};
