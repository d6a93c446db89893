//! The entity CRUD surface.
//!
//! An [`EntityService`] owns one model and orchestrates the full write path:
//! validate the payload, split it, open an explicit transaction scope, run the
//! entity/component/relation writes through that scope, then commit or roll
//! back. Reads go straight to the backend and populate nested fields and
//! relation aliases before returning.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use asupersync::{Cx, Outcome};
use contentmodel_core::{
    Backend, ComponentValue, Document, Error, ModelDef, ModelRegistry, Predicate, Query,
    RelationHandler, Row, StoreOps, TransactionOps, Value, row_to_document, try_outcome,
};
use contentmodel_query::{FilterParams, search_query};

use crate::components::{
    create_components, delete_components, load_components, update_components,
};
use crate::split::{pick_relations, select_attributes};
use crate::try_result;
use crate::validate::validate_nested;

/// What a delete removed: one targeted entity, or every match of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Deleted {
    /// The delete targeted a single entity by primary key.
    One(Document),
    /// The delete matched a filter; each entity was removed in its own
    /// transaction scope.
    Many(Vec<Document>),
}

/// CRUD engine for one content model.
pub struct EntityService<B, R> {
    model: Arc<ModelDef>,
    registry: Arc<ModelRegistry>,
    backend: Arc<B>,
    relations: Arc<R>,
}

impl<B: Backend, R: RelationHandler> EntityService<B, R> {
    /// Build a service for `model`, which must be registered in `registry`.
    pub fn new(
        model: Arc<ModelDef>,
        registry: Arc<ModelRegistry>,
        backend: Arc<B>,
        relations: Arc<R>,
    ) -> Self {
        Self {
            model,
            registry,
            backend,
            relations,
        }
    }

    /// The model this service operates on.
    #[must_use]
    pub fn model(&self) -> &ModelDef {
        &self.model
    }

    /// Fetch entities matching the filter parameters.
    ///
    /// `populate` restricts which relation aliases are eager-loaded; `None`
    /// loads every declared alias. Nested component fields are part of the
    /// entity and always materialized.
    #[tracing::instrument(level = "debug", skip(self, cx, params, populate), fields(model = %self.model.uid))]
    pub async fn find(
        &self,
        cx: &Cx,
        params: &FilterParams,
        populate: Option<&[String]>,
    ) -> Outcome<Vec<Document>, Error> {
        let query = params.to_query(&self.model.collection_name);
        self.fetch(cx, &query, populate).await
    }

    /// Fetch the first entity matching the filter parameters.
    #[tracing::instrument(level = "debug", skip(self, cx, params, populate), fields(model = %self.model.uid))]
    pub async fn find_one(
        &self,
        cx: &Cx,
        params: &FilterParams,
        populate: Option<&[String]>,
    ) -> Outcome<Option<Document>, Error> {
        let query = params.to_query(&self.model.collection_name).limit(1);
        let entries = try_outcome!(self.fetch(cx, &query, populate).await);
        Outcome::Ok(entries.into_iter().next())
    }

    /// Count entities matching the filter parameters.
    #[tracing::instrument(level = "debug", skip(self, cx, params), fields(model = %self.model.uid))]
    pub async fn count(&self, cx: &Cx, params: &FilterParams) -> Outcome<u64, Error> {
        let query = params.to_query(&self.model.collection_name);
        self.backend.count(cx, &query).await
    }

    /// Create an entity from a JSON payload and return it populated.
    #[tracing::instrument(level = "debug", skip(self, cx, payload), fields(model = %self.model.uid))]
    pub async fn create(&self, cx: &Cx, payload: &Document) -> Outcome<Document, Error> {
        let nested = try_result!(validate_nested(&self.model, payload, true));
        let relations = pick_relations(&self.model, payload);
        let mut values = try_result!(select_attributes(&self.model, payload));
        if let Some((created, updated)) = &self.model.timestamps {
            let now = now_millis();
            values.set(created, Value::BigInt(now));
            values.set(updated, Value::BigInt(now));
        }

        let tx = try_outcome!(self.backend.begin(cx).await);
        let written = self.create_in(cx, &tx, values, &nested, &relations).await;
        let id = try_outcome!(finish(cx, tx, written).await);
        self.require(cx, id).await
    }

    async fn create_in<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        values: Row,
        nested: &[(String, ComponentValue)],
        relations: &Document,
    ) -> Outcome<i64, Error> {
        let id = try_outcome!(ops.insert(cx, &self.model.collection_name, values).await);
        try_outcome!(create_components(cx, ops, &self.registry, &self.model, id, nested).await);
        if !relations.is_empty() {
            try_outcome!(
                self.relations
                    .update_relations(cx, ops, &self.model, id, relations)
                    .await
            );
        }
        Outcome::Ok(id)
    }

    /// Update the first entity matching the filter parameters and return it
    /// populated. Nested fields absent from the payload are left untouched;
    /// supplied ones are reconciled item by item.
    #[tracing::instrument(level = "debug", skip(self, cx, params, payload), fields(model = %self.model.uid))]
    pub async fn update(
        &self,
        cx: &Cx,
        params: &FilterParams,
        payload: &Document,
    ) -> Outcome<Document, Error> {
        let query = params.to_query(&self.model.collection_name).limit(1);
        let rows = try_outcome!(self.backend.select(cx, &query).await);
        let Some(row) = rows.into_iter().next() else {
            return Outcome::Err(Error::not_found(&self.model.uid));
        };
        let id = try_result!(row.get_named::<i64>(&self.model.primary_key));

        let nested = try_result!(validate_nested(&self.model, payload, false));
        let relations = pick_relations(&self.model, payload);
        let mut values = try_result!(select_attributes(&self.model, payload));
        if let Some((_, updated)) = &self.model.timestamps {
            values.set(updated, Value::BigInt(now_millis()));
        }

        let tx = try_outcome!(self.backend.begin(cx).await);
        let written = self.update_in(cx, &tx, id, values, &nested, &relations).await;
        try_outcome!(finish(cx, tx, written).await);
        self.require(cx, id).await
    }

    async fn update_in<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        id: i64,
        values: Row,
        nested: &[(String, ComponentValue)],
        relations: &Document,
    ) -> Outcome<(), Error> {
        if !values.is_empty() {
            try_outcome!(
                ops.update(
                    cx,
                    &self.model.collection_name,
                    &Predicate::eq(self.model.primary_key.as_str(), id),
                    values,
                )
                .await
            );
        }
        try_outcome!(update_components(cx, ops, &self.registry, &self.model, id, nested).await);
        if !relations.is_empty() {
            try_outcome!(
                self.relations
                    .update_relations(cx, ops, &self.model, id, relations)
                    .await
            );
        }
        Outcome::Ok(())
    }

    /// Delete entities matching the filter parameters.
    ///
    /// Exactly one equality filter on the primary key targets a single entity
    /// and returns [`Deleted::One`]; anything else deletes every match, each
    /// in its own transaction scope, and returns [`Deleted::Many`].
    #[tracing::instrument(level = "debug", skip(self, cx, params), fields(model = %self.model.uid))]
    pub async fn delete(&self, cx: &Cx, params: &FilterParams) -> Outcome<Deleted, Error> {
        if let Some(id) = params.exact_primary_key(&self.model.primary_key) {
            let entry = try_outcome!(self.delete_one(cx, id).await);
            return Outcome::Ok(Deleted::One(entry));
        }
        let matches = try_outcome!(self.find(cx, params, None).await);
        let mut deleted = Vec::with_capacity(matches.len());
        for entry in matches {
            let Some(id) = entry
                .get(&self.model.primary_key)
                .and_then(serde_json::Value::as_i64)
            else {
                continue;
            };
            deleted.push(try_outcome!(self.delete_one(cx, id).await));
        }
        Outcome::Ok(Deleted::Many(deleted))
    }

    async fn delete_one(&self, cx: &Cx, id: i64) -> Outcome<Document, Error> {
        let Some(entry) = try_outcome!(self.fetch_by_id(cx, id).await) else {
            return Outcome::Err(Error::not_found(&self.model.uid));
        };

        // Inbound relation links are severed before the transaction scope
        // opens; a failure past this point leaves the entity unlinked but
        // present.
        try_outcome!(
            self.relations
                .delete_relations(cx, self.backend.as_ref(), &self.model, id)
                .await
        );

        let tx = try_outcome!(self.backend.begin(cx).await);
        let removed = self.delete_in(cx, &tx, id).await;
        try_outcome!(finish(cx, tx, removed).await);
        Outcome::Ok(entry)
    }

    async fn delete_in<O: StoreOps>(&self, cx: &Cx, ops: &O, id: i64) -> Outcome<(), Error> {
        try_outcome!(delete_components(cx, ops, &self.registry, &self.model, id).await);
        // A row that vanished between the lookup and here is not an error;
        // the not-found check already happened against the fetched entry.
        try_outcome!(
            ops.delete(
                cx,
                &self.model.collection_name,
                &Predicate::eq(self.model.primary_key.as_str(), id),
            )
            .await
        );
        Outcome::Ok(())
    }

    /// Free-text search over the model's searchable attributes.
    ///
    /// `populate` restricts eager-loaded relation aliases as in
    /// [`EntityService::find`].
    #[tracing::instrument(level = "debug", skip(self, cx, params, populate), fields(model = %self.model.uid))]
    pub async fn search(
        &self,
        cx: &Cx,
        params: &FilterParams,
        populate: Option<&[String]>,
    ) -> Outcome<Vec<Document>, Error> {
        let query = search_query(&self.model, params);
        self.fetch(cx, &query, populate).await
    }

    /// Count free-text search matches.
    #[tracing::instrument(level = "debug", skip(self, cx, params), fields(model = %self.model.uid))]
    pub async fn count_search(&self, cx: &Cx, params: &FilterParams) -> Outcome<u64, Error> {
        let query = search_query(&self.model, params);
        self.backend.count(cx, &query).await
    }

    /// Run a query and populate every returned entity.
    async fn fetch(
        &self,
        cx: &Cx,
        query: &Query,
        populate: Option<&[String]>,
    ) -> Outcome<Vec<Document>, Error> {
        let rows = try_outcome!(self.backend.select(cx, query).await);
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let mut entry = row_to_document(&row);
            try_outcome!(
                self.populate(cx, self.backend.as_ref(), &mut entry, populate)
                    .await
            );
            entries.push(entry);
        }
        Outcome::Ok(entries)
    }

    async fn fetch_by_id(&self, cx: &Cx, id: i64) -> Outcome<Option<Document>, Error> {
        let query = Query::new(self.model.collection_name.clone())
            .filter(Predicate::eq(self.model.primary_key.as_str(), id))
            .limit(1);
        let entries = try_outcome!(self.fetch(cx, &query, None).await);
        Outcome::Ok(entries.into_iter().next())
    }

    async fn require(&self, cx: &Cx, id: i64) -> Outcome<Document, Error> {
        match try_outcome!(self.fetch_by_id(cx, id).await) {
            Some(entry) => Outcome::Ok(entry),
            None => Outcome::Err(Error::not_found(&self.model.uid)),
        }
    }

    async fn populate<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        entry: &mut Document,
        populate: Option<&[String]>,
    ) -> Outcome<(), Error> {
        try_outcome!(load_components(cx, ops, &self.registry, &self.model, entry).await);
        let aliases: Vec<String> = self
            .model
            .associations
            .iter()
            .map(|a| a.alias.clone())
            .filter(|alias| populate.is_none_or(|requested| requested.contains(alias)))
            .collect();
        if aliases.is_empty() {
            return Outcome::Ok(());
        }
        self.relations
            .load_relations(cx, ops, &self.model, entry, &aliases)
            .await
    }
}

/// Commit on success, roll back on any other outcome, propagating the
/// original result either way.
async fn finish<T, X: TransactionOps>(
    cx: &Cx,
    tx: X,
    result: Outcome<T, Error>,
) -> Outcome<T, Error> {
    match result {
        Outcome::Ok(value) => match tx.commit(cx).await {
            Outcome::Ok(()) => Outcome::Ok(value),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        },
        other => {
            let _ = tx.rollback(cx).await;
            other
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}
