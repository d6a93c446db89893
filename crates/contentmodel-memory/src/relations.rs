//! Relation link storage for the in-memory backend.
//!
//! Singular natures live as a foreign-key column named after the alias on the
//! owning row. Collection natures live in a link table per alias, named
//! `<collection>__<alias>`, one `(owner_id, target_id)` row per link in
//! payload order. References in payloads are either bare identifiers or
//! objects carrying the target's primary key.

use std::sync::Arc;

use asupersync::{Cx, Outcome};
use contentmodel_core::{
    Document, Error, ModelDef, ModelRegistry, Predicate, Query, RelationHandler, Row, StoreOps,
    Value, row_to_document, try_outcome,
};

/// Link-table column holding the owning entity id.
pub const OWNER_COLUMN: &str = "owner_id";
/// Link-table column holding the referenced entity id.
pub const TARGET_COLUMN: &str = "target_id";

/// The link table backing a collection-natured alias.
#[must_use]
pub fn link_table(collection: &str, alias: &str) -> String {
    format!("{collection}__{alias}")
}

/// Read a reference out of a payload value: a bare id or an object with `id`.
fn ref_id(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.get("id").and_then(serde_json::Value::as_i64))
}

/// A [`RelationHandler`] persisting links in the same store as the entities.
pub struct MemoryRelations {
    registry: Arc<ModelRegistry>,
}

impl MemoryRelations {
    /// Build a handler over the given model registry.
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }
}

impl RelationHandler for MemoryRelations {
    async fn update_relations<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        model: &ModelDef,
        id: i64,
        values: &Document,
    ) -> Outcome<(), Error> {
        for (alias, raw) in values {
            let Some(assoc) = model.assoc(alias) else {
                continue;
            };
            if assoc.nature.is_collection() {
                let table = link_table(&model.collection_name, alias);
                try_outcome!(
                    ops.delete(cx, &table, &Predicate::eq(OWNER_COLUMN, id)).await
                );
                let targets = match raw {
                    serde_json::Value::Array(items) => items.as_slice(),
                    serde_json::Value::Null => &[],
                    other => {
                        return Outcome::Err(Error::relation(
                            alias,
                            format!("expected an array of references, got {other}"),
                        ));
                    }
                };
                for target in targets {
                    let Some(target_id) = ref_id(target) else {
                        return Outcome::Err(Error::relation(
                            alias,
                            format!("reference {target} has no identifier"),
                        ));
                    };
                    let link = Row::new()
                        .with(OWNER_COLUMN, Value::BigInt(id))
                        .with(TARGET_COLUMN, Value::BigInt(target_id));
                    try_outcome!(ops.insert(cx, &table, link).await);
                }
            } else {
                let value = match raw {
                    serde_json::Value::Null => Value::Null,
                    other => match ref_id(other) {
                        Some(target_id) => Value::BigInt(target_id),
                        None => {
                            return Outcome::Err(Error::relation(
                                alias,
                                format!("reference {other} has no identifier"),
                            ));
                        }
                    },
                };
                let column = Row::new().with(alias.as_str(), value);
                try_outcome!(
                    ops.update(
                        cx,
                        &model.collection_name,
                        &Predicate::eq(model.primary_key.as_str(), id),
                        column,
                    )
                    .await
                );
            }
        }
        Outcome::Ok(())
    }

    async fn delete_relations<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        model: &ModelDef,
        id: i64,
    ) -> Outcome<(), Error> {
        // Inbound: any alias on any model targeting this one.
        for other in self.registry.iter() {
            for assoc in &other.associations {
                if assoc.target != model.uid {
                    continue;
                }
                if assoc.nature.is_collection() {
                    let table = link_table(&other.collection_name, &assoc.alias);
                    try_outcome!(
                        ops.delete(cx, &table, &Predicate::eq(TARGET_COLUMN, id)).await
                    );
                } else {
                    let cleared = Row::new().with(assoc.alias.as_str(), Value::Null);
                    try_outcome!(
                        ops.update(
                            cx,
                            &other.collection_name,
                            &Predicate::eq(assoc.alias.as_str(), id),
                            cleared,
                        )
                        .await
                    );
                }
            }
        }
        // Outbound link rows owned by the deleted entity.
        for assoc in &model.associations {
            if assoc.nature.is_collection() {
                let table = link_table(&model.collection_name, &assoc.alias);
                try_outcome!(
                    ops.delete(cx, &table, &Predicate::eq(OWNER_COLUMN, id)).await
                );
            }
        }
        Outcome::Ok(())
    }

    async fn load_relations<O: StoreOps>(
        &self,
        cx: &Cx,
        ops: &O,
        model: &ModelDef,
        entry: &mut Document,
        aliases: &[String],
    ) -> Outcome<(), Error> {
        let Some(id) = entry
            .get(&model.primary_key)
            .and_then(serde_json::Value::as_i64)
        else {
            return Outcome::Ok(());
        };
        for alias in aliases {
            let Some(assoc) = model.assoc(alias) else {
                continue;
            };
            let Ok(target_model) = self.registry.get(&assoc.target) else {
                continue;
            };
            if assoc.nature.is_collection() {
                let table = link_table(&model.collection_name, alias);
                let links = try_outcome!(
                    ops.select(
                        cx,
                        &Query::new(table).filter(Predicate::eq(OWNER_COLUMN, id)),
                    )
                    .await
                );
                let mut loaded = Vec::with_capacity(links.len());
                for link in links {
                    let Ok(target_id) = link.get_named::<i64>(TARGET_COLUMN) else {
                        continue;
                    };
                    if let Some(doc) =
                        try_outcome!(fetch_by_id(cx, ops, &target_model, target_id).await)
                    {
                        loaded.push(serde_json::Value::Object(doc));
                    }
                }
                entry.insert(alias.clone(), serde_json::Value::Array(loaded));
            } else {
                let target_id = entry.get(alias).and_then(serde_json::Value::as_i64);
                let loaded = match target_id {
                    Some(target_id) => {
                        try_outcome!(fetch_by_id(cx, ops, &target_model, target_id).await)
                            .map_or(serde_json::Value::Null, serde_json::Value::Object)
                    }
                    None => serde_json::Value::Null,
                };
                entry.insert(alias.clone(), loaded);
            }
        }
        Outcome::Ok(())
    }
}

async fn fetch_by_id<O: StoreOps>(
    cx: &Cx,
    ops: &O,
    model: &ModelDef,
    id: i64,
) -> Outcome<Option<Document>, Error> {
    let query = Query::new(model.collection_name.clone())
        .filter(Predicate::eq(model.primary_key.as_str(), id))
        .limit(1);
    let rows = try_outcome!(ops.select(cx, &query).await);
    Outcome::Ok(rows.first().map(row_to_document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use asupersync::runtime::RuntimeBuilder;
    use contentmodel_core::{AssociationDef, AssociationNature, AttributeDef};
    use serde_json::json;

    fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> Result<T, String> {
        match outcome {
            Outcome::Ok(v) => Ok(v),
            Outcome::Err(e) => Err(format!("unexpected error: {e}")),
            Outcome::Cancelled(r) => Err(format!("cancelled: {r:?}")),
            Outcome::Panicked(p) => Err(format!("panicked: {p:?}")),
        }
    }

    fn registry() -> Arc<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        registry.register(
            ModelDef::new("application::author", "authors")
                .attribute(AttributeDef::string("name")),
        );
        registry.register(
            ModelDef::new("application::article", "articles")
                .attribute(AttributeDef::string("title"))
                .association(AssociationDef::new(
                    "author",
                    "application::author",
                    AssociationNature::ManyToOne,
                ))
                .association(AssociationDef::new(
                    "tags",
                    "application::tag",
                    AssociationNature::ManyToMany,
                )),
        );
        registry.register(
            ModelDef::new("application::tag", "tags").attribute(AttributeDef::string("label")),
        );
        Arc::new(registry)
    }

    fn doc(value: serde_json::Value) -> Document {
        let serde_json::Value::Object(map) = value else {
            panic!("expected object");
        };
        map
    }

    #[test]
    fn test_link_and_load_round_trip() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        rt.block_on(async {
            let registry = registry();
            let backend = MemoryBackend::new();
            let handler = MemoryRelations::new(Arc::clone(&registry));
            let article_model = registry.get("application::article").unwrap();

            let author = unwrap_outcome(
                backend
                    .insert(&cx, "authors", Row::new().with("name", Value::from("Ada")))
                    .await,
            )
            .unwrap();
            let tag = unwrap_outcome(
                backend
                    .insert(&cx, "tags", Row::new().with("label", Value::from("rust")))
                    .await,
            )
            .unwrap();
            let article = unwrap_outcome(
                backend
                    .insert(&cx, "articles", Row::new().with("title", Value::from("T")))
                    .await,
            )
            .unwrap();

            let values = doc(json!({"author": author, "tags": [tag]}));
            unwrap_outcome(
                handler
                    .update_relations(&cx, &backend, &article_model, article, &values)
                    .await,
            )
            .unwrap();

            let mut entry = doc(json!({"id": article, "title": "T", "author": author}));
            unwrap_outcome(
                handler
                    .load_relations(
                        &cx,
                        &backend,
                        &article_model,
                        &mut entry,
                        &["author".to_string(), "tags".to_string()],
                    )
                    .await,
            )
            .unwrap();
            assert_eq!(entry["author"]["name"], json!("Ada"));
            assert_eq!(entry["tags"][0]["label"], json!("rust"));
        });
    }

    #[test]
    fn test_delete_relations_severs_inbound_links() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        rt.block_on(async {
            let registry = registry();
            let backend = MemoryBackend::new();
            let handler = MemoryRelations::new(Arc::clone(&registry));
            let article_model = registry.get("application::article").unwrap();
            let author_model = registry.get("application::author").unwrap();
            let tag_model = registry.get("application::tag").unwrap();

            let author = unwrap_outcome(
                backend
                    .insert(&cx, "authors", Row::new().with("name", Value::from("Ada")))
                    .await,
            )
            .unwrap();
            let tag = unwrap_outcome(
                backend
                    .insert(&cx, "tags", Row::new().with("label", Value::from("rust")))
                    .await,
            )
            .unwrap();
            let article = unwrap_outcome(
                backend
                    .insert(&cx, "articles", Row::new().with("title", Value::from("T")))
                    .await,
            )
            .unwrap();
            let values = doc(json!({"author": author, "tags": [tag]}));
            unwrap_outcome(
                handler
                    .update_relations(&cx, &backend, &article_model, article, &values)
                    .await,
            )
            .unwrap();

            // Deleting the author nulls the article's singular alias.
            unwrap_outcome(
                handler
                    .delete_relations(&cx, &backend, &author_model, author)
                    .await,
            )
            .unwrap();
            let rows = unwrap_outcome(
                backend
                    .select(
                        &cx,
                        &Query::new("articles").filter(Predicate::eq("id", article)),
                    )
                    .await,
            )
            .unwrap();
            assert_eq!(rows[0].named("author"), Some(&Value::Null));

            // Deleting the tag empties the link table.
            unwrap_outcome(
                handler
                    .delete_relations(&cx, &backend, &tag_model, tag)
                    .await,
            )
            .unwrap();
            let links = unwrap_outcome(
                backend
                    .count(&cx, &Query::new(link_table("articles", "tags")))
                    .await,
            )
            .unwrap();
            assert_eq!(links, 0);
        });
    }
}
