//! Runtime content-model metadata.
//!
//! Models are defined at runtime — end users of a CMS declare schemas, and the
//! engine receives them as [`ModelDef`] records through a [`ModelRegistry`].
//! All engine behavior (attribute splitting, component persistence, search)
//! is driven by table lookups into this metadata; there is no reflection.

use std::collections::HashMap;
use std::sync::Arc;

use crate::association::AssociationDef;
use crate::error::{Error, Result};
use crate::value::Value;

/// Scalar attribute kinds a content model can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Short text.
    String,
    /// Long text.
    Text,
    /// 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// Arbitrary JSON.
    Json,
    /// Datetime, stored as unix-epoch milliseconds.
    Datetime,
}

impl ScalarKind {
    /// Whether free-text search should run a full-text match over this kind.
    #[must_use]
    pub fn is_searchable_text(&self) -> bool {
        matches!(self, ScalarKind::String | ScalarKind::Text)
    }

    /// Whether free-text search should try exact numeric matching.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarKind::Integer | ScalarKind::Float)
    }

    /// Coerce a JSON payload value into the backend [`Value`] for this kind.
    ///
    /// `null` always coerces to [`Value::Null`]; anything else must match the
    /// declared kind.
    pub fn coerce(&self, field: &str, value: &serde_json::Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let coerced = match self {
            ScalarKind::String | ScalarKind::Text => value.as_str().map(Value::from),
            ScalarKind::Integer | ScalarKind::Datetime => value.as_i64().map(Value::BigInt),
            ScalarKind::Float => value.as_f64().map(Value::Double),
            ScalarKind::Boolean => value.as_bool().map(Value::Bool),
            ScalarKind::Json => Some(Value::Json(value.clone())),
        };
        coerced.ok_or_else(|| {
            Error::validation(field, format!("expected {self:?} value, got {value}"))
        })
    }
}

/// Metadata for a nested component attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentAttr {
    /// Uid of the component model this field embeds.
    pub component: String,
    /// Whether the field holds an ordered list rather than a single object.
    pub repeatable: bool,
    /// Whether the field must be supplied on create.
    pub required: bool,
    /// Minimum item count (repeatable only; conditional, see validator).
    pub min: Option<u32>,
    /// Maximum item count (repeatable only; unconditional).
    pub max: Option<u32>,
}

/// Metadata for a dynamic-zone attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicZoneAttr {
    /// Uids of the component models items may declare.
    pub components: Vec<String>,
    /// Whether the field must be supplied on create.
    pub required: bool,
    /// Minimum item count (conditional, see validator).
    pub min: Option<u32>,
    /// Maximum item count (unconditional).
    pub max: Option<u32>,
}

/// What an attribute holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// A scalar column on the model's own table.
    Scalar(ScalarKind),
    /// A nested component sub-document (single or repeatable).
    Component(ComponentAttr),
    /// A heterogeneous, ordered list of self-declared components.
    DynamicZone(DynamicZoneAttr),
}

/// One declared attribute on a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    /// Attribute (and column / join-field) name.
    pub name: String,
    /// What the attribute holds.
    pub kind: AttributeKind,
}

impl AttributeDef {
    fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Scalar(kind),
        }
    }

    /// Short text attribute.
    pub fn string(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::String)
    }

    /// Long text attribute.
    pub fn text(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Text)
    }

    /// Integer attribute.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Integer)
    }

    /// Float attribute.
    pub fn float(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Float)
    }

    /// Boolean attribute.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Boolean)
    }

    /// JSON attribute.
    pub fn json(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Json)
    }

    /// Datetime attribute.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Datetime)
    }

    /// Single nested component attribute.
    pub fn component(name: impl Into<String>, component_uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Component(ComponentAttr {
                component: component_uid.into(),
                repeatable: false,
                required: false,
                min: None,
                max: None,
            }),
        }
    }

    /// Dynamic-zone attribute allowing the given component uids.
    pub fn dynamic_zone<I, S>(name: impl Into<String>, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: AttributeKind::DynamicZone(DynamicZoneAttr {
                components: components.into_iter().map(Into::into).collect(),
                required: false,
                min: None,
                max: None,
            }),
        }
    }

    /// Mark a component attribute repeatable.
    #[must_use]
    pub fn repeatable(mut self) -> Self {
        if let AttributeKind::Component(c) = &mut self.kind {
            c.repeatable = true;
        }
        self
    }

    /// Mark a component/dynamic-zone attribute required.
    #[must_use]
    pub fn required(mut self) -> Self {
        match &mut self.kind {
            AttributeKind::Component(c) => c.required = true,
            AttributeKind::DynamicZone(z) => z.required = true,
            AttributeKind::Scalar(_) => {}
        }
        self
    }

    /// Set the minimum item count.
    #[must_use]
    pub fn min(mut self, min: u32) -> Self {
        match &mut self.kind {
            AttributeKind::Component(c) => c.min = Some(min),
            AttributeKind::DynamicZone(z) => z.min = Some(min),
            AttributeKind::Scalar(_) => {}
        }
        self
    }

    /// Set the maximum item count.
    #[must_use]
    pub fn max(mut self, max: u32) -> Self {
        match &mut self.kind {
            AttributeKind::Component(c) => c.max = Some(max),
            AttributeKind::DynamicZone(z) => z.max = Some(max),
            AttributeKind::Scalar(_) => {}
        }
        self
    }

    /// Whether this attribute is a component or dynamic zone.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(
            self.kind,
            AttributeKind::Component(_) | AttributeKind::DynamicZone(_)
        )
    }
}

/// The polymorphic join table linking an entity to its component instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    /// Join table name.
    pub table: String,
    /// Foreign-key column pointing at the owning entity.
    pub entity_fk: String,
}

/// A runtime-defined content model (or component model).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    /// Registry key, e.g. `"application::article"`.
    pub uid: String,
    /// Storage collection (table) name. Doubles as the join-table type
    /// discriminant for component models.
    pub collection_name: String,
    /// Primary-key column name.
    pub primary_key: String,
    /// Declared attributes, in declaration order.
    pub attributes: Vec<AttributeDef>,
    /// Declared associations.
    pub associations: Vec<AssociationDef>,
    /// Configured `(created, updated)` timestamp column names, if any.
    pub timestamps: Option<(String, String)>,
    /// Component join table, present when the model declares nested fields.
    pub join_table: Option<JoinTable>,
    /// Whether this model is a component model rather than a primary one.
    pub is_component: bool,
}

impl ModelDef {
    /// Start a primary content model definition.
    pub fn new(uid: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            collection_name: collection_name.into(),
            primary_key: "id".to_string(),
            attributes: Vec::new(),
            associations: Vec::new(),
            timestamps: None,
            join_table: None,
            is_component: false,
        }
    }

    /// Start a component model definition.
    pub fn component(uid: impl Into<String>, collection_name: impl Into<String>) -> Self {
        let mut def = Self::new(uid, collection_name);
        def.is_component = true;
        def
    }

    /// Override the primary-key column name.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Declare an attribute.
    #[must_use]
    pub fn attribute(mut self, attr: AttributeDef) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Declare an association.
    #[must_use]
    pub fn association(mut self, assoc: AssociationDef) -> Self {
        self.associations.push(assoc);
        self
    }

    /// Configure timestamp columns maintained by the engine.
    #[must_use]
    pub fn timestamps(mut self, created: impl Into<String>, updated: impl Into<String>) -> Self {
        self.timestamps = Some((created.into(), updated.into()));
        self
    }

    /// Configure the component join table.
    #[must_use]
    pub fn join_table(mut self, table: impl Into<String>, entity_fk: impl Into<String>) -> Self {
        self.join_table = Some(JoinTable {
            table: table.into(),
            entity_fk: entity_fk.into(),
        });
        self
    }

    /// Look up a declared attribute by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up a declared association by alias.
    #[must_use]
    pub fn assoc(&self, alias: &str) -> Option<&AssociationDef> {
        self.associations.iter().find(|a| a.alias == alias)
    }

    /// Whether `key` is a declared relation alias.
    #[must_use]
    pub fn is_relation(&self, key: &str) -> bool {
        self.assoc(key).is_some()
    }

    /// Whether `key` is a configured timestamp column.
    #[must_use]
    pub fn is_timestamp(&self, key: &str) -> bool {
        self.timestamps
            .as_ref()
            .is_some_and(|(c, u)| c == key || u == key)
    }

    /// Component and dynamic-zone attributes, in declaration order.
    pub fn nested_attributes(&self) -> impl Iterator<Item = &AttributeDef> {
        self.attributes.iter().filter(|a| a.is_nested())
    }

    /// Scalar attributes, in declaration order.
    pub fn scalar_attributes(&self) -> impl Iterator<Item = (&str, ScalarKind)> {
        self.attributes.iter().filter_map(|a| match &a.kind {
            AttributeKind::Scalar(kind) => Some((a.name.as_str(), *kind)),
            _ => None,
        })
    }

    /// The component join table, failing when the model never declared one.
    pub fn join(&self) -> Result<&JoinTable> {
        self.join_table.as_ref().ok_or_else(|| {
            Error::backend(format!("model {} has no component join table", self.uid))
        })
    }
}

/// Registry of all known models and component models, keyed by uid.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelDef>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model, returning its shared handle.
    pub fn register(&mut self, def: ModelDef) -> Arc<ModelDef> {
        let def = Arc::new(def);
        self.models.insert(def.uid.clone(), Arc::clone(&def));
        def
    }

    /// Look up a model by uid.
    pub fn get(&self, uid: &str) -> Result<Arc<ModelDef>> {
        self.models
            .get(uid)
            .cloned()
            .ok_or_else(|| Error::backend(format!("unknown model {uid}")))
    }

    /// Resolve a join-record type discriminant (a component model's
    /// collection name) back to its model metadata.
    #[must_use]
    pub fn component_by_collection(&self, collection_name: &str) -> Option<Arc<ModelDef>> {
        self.models
            .values()
            .find(|m| m.is_component && m.collection_name == collection_name)
            .cloned()
    }

    /// Iterate all registered models.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelDef>> {
        self.models.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> ModelDef {
        ModelDef::component("components::section", "components_sections")
            .attribute(AttributeDef::string("text"))
    }

    fn article() -> ModelDef {
        ModelDef::new("application::article", "articles")
            .attribute(AttributeDef::string("title"))
            .attribute(
                AttributeDef::component("sections", "components::section")
                    .repeatable()
                    .min(1)
                    .max(5),
            )
            .join_table("articles_components", "article_id")
            .timestamps("created_at", "updated_at")
    }

    #[test]
    fn test_attribute_builder_chain() {
        let attr = AttributeDef::component("sections", "components::section")
            .repeatable()
            .required()
            .min(1)
            .max(3);
        let AttributeKind::Component(c) = &attr.kind else {
            panic!("expected component kind");
        };
        assert!(c.repeatable);
        assert!(c.required);
        assert_eq!(c.min, Some(1));
        assert_eq!(c.max, Some(3));
    }

    #[test]
    fn test_model_lookups() {
        let model = article();
        assert!(model.attr("title").is_some());
        assert!(model.attr("unknown").is_none());
        assert!(model.is_timestamp("created_at"));
        assert!(!model.is_timestamp("title"));
        assert_eq!(model.nested_attributes().count(), 1);
        assert_eq!(model.join().unwrap().entity_fk, "article_id");
    }

    #[test]
    fn test_registry_discriminant_lookup() {
        let mut registry = ModelRegistry::new();
        registry.register(section());
        registry.register(article());

        let found = registry
            .component_by_collection("components_sections")
            .unwrap();
        assert_eq!(found.uid, "components::section");
        assert!(registry.component_by_collection("articles").is_none());
        assert!(registry.get("application::article").is_ok());
        assert!(registry.get("nope").is_err());
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(
            ScalarKind::String
                .coerce("title", &serde_json::json!("A"))
                .unwrap(),
            Value::Text("A".into())
        );
        assert_eq!(
            ScalarKind::Integer
                .coerce("views", &serde_json::json!(9))
                .unwrap(),
            Value::BigInt(9)
        );
        assert_eq!(
            ScalarKind::Boolean
                .coerce("draft", &serde_json::Value::Null)
                .unwrap(),
            Value::Null
        );
        let err = ScalarKind::Integer
            .coerce("views", &serde_json::json!("nine"))
            .unwrap_err();
        assert_eq!(err.status(), 400);
    }
}
