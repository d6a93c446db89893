//! Entity query engine for runtime-defined content models.
//!
//! `contentmodel` persists CMS-style entities whose schemas are declared at
//! runtime: scalar attributes, nested components, dynamic zones, and
//! associations. The facade re-exports the whole workspace:
//!
//! - [`contentmodel_core`]: values, rows, model metadata, storage traits.
//! - [`contentmodel_query`]: REST filter translation, search predicates, SQL
//!   rendering per dialect.
//! - [`contentmodel_engine`]: payload validation, component persistence, the
//!   [`EntityService`] CRUD surface.
//! - [`contentmodel_memory`]: the in-memory reference backend.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use contentmodel::prelude::*;
//! use contentmodel::{MemoryBackend, MemoryRelations};
//!
//! let mut registry = ModelRegistry::new();
//! registry.register(
//!     ModelDef::component("components::section", "components_sections")
//!         .attribute(AttributeDef::string("text")),
//! );
//! let article = registry.register(
//!     ModelDef::new("application::article", "articles")
//!         .attribute(AttributeDef::string("title"))
//!         .attribute(AttributeDef::component("sections", "components::section").repeatable())
//!         .join_table("articles_components", "article_id"),
//! );
//! let registry = Arc::new(registry);
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let relations = Arc::new(MemoryRelations::new(Arc::clone(&registry)));
//! let service = EntityService::new(article, registry, backend, relations);
//! # let _ = service;
//! ```

pub use contentmodel_core::{
    AssociationDef, AssociationNature, AttributeDef, AttributeKind, Backend, COMPONENT_KEY,
    CompareOp, ComponentAttr, ComponentValue, Cx, Dialect, Document, DynamicZoneAttr, Error,
    FromValue, JoinTable, ModelDef, ModelRegistry, Outcome, Predicate, Query, RelationHandler,
    Result, Row, ScalarKind, SortOrder, StoreOps, TransactionOps, Value, ZoneEntry,
    row_to_document, supplied_id, try_outcome,
};
pub use contentmodel_engine::{Deleted, EntityService, validate_nested};
pub use contentmodel_memory::{MemoryBackend, MemoryRelations, MemoryTransaction};
pub use contentmodel_query::{FilterParams, count_sql, search_predicate, search_query, to_sql};

/// The common imports for working with the engine.
pub mod prelude {
    pub use contentmodel_core::{
        AssociationDef, AssociationNature, AttributeDef, Backend, ComponentValue, Cx, Document,
        Error, ModelDef, ModelRegistry, Outcome, Predicate, Query, RelationHandler, Row,
        SortOrder, StoreOps, TransactionOps, Value,
    };
    pub use contentmodel_engine::{Deleted, EntityService};
    pub use contentmodel_query::FilterParams;
}
