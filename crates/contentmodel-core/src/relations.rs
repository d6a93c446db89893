//! The relation-persistence collaborator interface.
//!
//! Relation link storage (foreign-key columns, link tables, morph tables) is
//! owned by an external collaborator, not by the entity query engine. The
//! engine tells the collaborator *when* to persist, unlink, or load relation
//! aliases; the collaborator decides *how*. Every method is generic over
//! [`StoreOps`] so calls land inside whatever transaction scope the engine is
//! currently holding.

use asupersync::{Cx, Outcome};

use crate::error::Error;
use crate::model::ModelDef;
use crate::payload::Document;
use crate::store::StoreOps;

/// Persists, severs, and loads relation links for entities.
pub trait RelationHandler: Send + Sync {
    /// Persist the supplied relation aliases for the entity with id `id`.
    /// `values` maps alias → new reference value(s).
    fn update_relations<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        model: &ModelDef,
        id: i64,
        values: &Document,
    ) -> impl std::future::Future<Output = Outcome<(), Error>> + Send;

    /// Sever every relation alias (on any model) pointing at entity `id`:
    /// singular natures null out, collection natures empty out.
    fn delete_relations<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        model: &ModelDef,
        id: i64,
    ) -> impl std::future::Future<Output = Outcome<(), Error>> + Send;

    /// Materialize the given relation aliases into `entry`.
    fn load_relations<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        model: &ModelDef,
        entry: &mut Document,
        aliases: &[String],
    ) -> impl std::future::Future<Output = Outcome<(), Error>> + Send;
}
