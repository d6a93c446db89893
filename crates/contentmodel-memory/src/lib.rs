//! In-memory storage for contentmodel.
//!
//! A complete [`Backend`](contentmodel_core::Backend) and
//! [`RelationHandler`](contentmodel_core::RelationHandler) pair with no
//! external storage: tables are vectors behind a mutex, transactions are
//! whole-store snapshots, and relation links live in per-alias link tables.
//! Single-writer semantics make it the reference backend for tests and for
//! embedding the engine without a database.

mod backend;
mod eval;
mod relations;

pub use backend::{ID_COLUMN, MemoryBackend, MemoryTransaction};
pub use relations::{MemoryRelations, OWNER_COLUMN, TARGET_COLUMN, link_table};
