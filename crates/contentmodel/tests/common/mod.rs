//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use contentmodel::prelude::*;
use contentmodel::{MemoryBackend, MemoryRelations};

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> Result<T, String> {
    match outcome {
        Outcome::Ok(v) => Ok(v),
        Outcome::Err(e) => Err(format!("unexpected error: {e}")),
        Outcome::Cancelled(r) => Err(format!("cancelled: {r:?}")),
        Outcome::Panicked(p) => Err(format!("panicked: {p:?}")),
    }
}

pub fn expect_err<T: std::fmt::Debug>(outcome: Outcome<T, Error>) -> Error {
    match outcome {
        Outcome::Ok(v) => panic!("expected an error, got {v:?}"),
        Outcome::Err(e) => e,
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

pub fn doc(value: serde_json::Value) -> Document {
    let serde_json::Value::Object(map) = value else {
        panic!("expected a JSON object");
    };
    map
}

/// A registry with an article model, a page model carrying a required hero,
/// two component models, and two related plain models, all sharing one
/// in-memory store.
pub struct Fixture {
    pub registry: Arc<ModelRegistry>,
    pub backend: Arc<MemoryBackend>,
    pub relations: Arc<MemoryRelations>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut registry = ModelRegistry::new();
        registry.register(
            ModelDef::component("components::section", "components_sections")
                .attribute(AttributeDef::string("text"))
                .attribute(AttributeDef::integer("length")),
        );
        registry.register(
            ModelDef::component("components::quote", "components_quotes")
                .attribute(AttributeDef::text("quote"))
                .attribute(AttributeDef::string("attribution")),
        );
        registry.register(
            ModelDef::new("application::page", "pages")
                .attribute(AttributeDef::string("slug"))
                .attribute(AttributeDef::component("hero", "components::section").required())
                .join_table("pages_components", "page_id"),
        );
        registry.register(
            ModelDef::new("application::author", "authors")
                .attribute(AttributeDef::string("name")),
        );
        registry.register(
            ModelDef::new("application::tag", "tags").attribute(AttributeDef::string("label")),
        );
        registry.register(
            ModelDef::new("application::article", "articles")
                .attribute(AttributeDef::string("title"))
                .attribute(AttributeDef::text("body"))
                .attribute(AttributeDef::integer("views"))
                .attribute(AttributeDef::float("score"))
                .attribute(AttributeDef::boolean("published"))
                .attribute(AttributeDef::component("hero", "components::section"))
                .attribute(
                    AttributeDef::component("sections", "components::section")
                        .repeatable()
                        .min(1)
                        .max(3),
                )
                .attribute(AttributeDef::dynamic_zone(
                    "blocks",
                    ["components::section", "components::quote"],
                ))
                .association(AssociationDef::new(
                    "author",
                    "application::author",
                    AssociationNature::ManyToOne,
                ))
                .association(AssociationDef::new(
                    "tags",
                    "application::tag",
                    AssociationNature::ManyToMany,
                ))
                .join_table("articles_components", "article_id")
                .timestamps("created_at", "updated_at"),
        );

        let registry = Arc::new(registry);
        let backend = Arc::new(MemoryBackend::new());
        let relations = Arc::new(MemoryRelations::new(Arc::clone(&registry)));
        Self {
            registry,
            backend,
            relations,
        }
    }

    pub fn service(&self, uid: &str) -> EntityService<MemoryBackend, MemoryRelations> {
        let model = self.registry.get(uid).expect("model registered");
        EntityService::new(
            model,
            Arc::clone(&self.registry),
            Arc::clone(&self.backend),
            Arc::clone(&self.relations),
        )
    }

    pub fn articles(&self) -> EntityService<MemoryBackend, MemoryRelations> {
        self.service("application::article")
    }

    pub fn pages(&self) -> EntityService<MemoryBackend, MemoryRelations> {
        self.service("application::page")
    }
}
