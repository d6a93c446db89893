//! Typed nested-payload values.
//!
//! Raw payloads arrive as JSON. The validator converts each nested field into
//! a [`ComponentValue`] at the boundary, so the component store never performs
//! duck-typed shape checks on its hot path.

use crate::row::Row;

/// A JSON object payload or entity document.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Convert a storage row into a JSON document.
#[must_use]
pub fn row_to_document(row: &Row) -> Document {
    row.iter()
        .map(|(column, value)| (column.to_string(), value.to_json()))
        .collect()
}

/// The discriminant key a dynamic-zone item uses to declare its component type.
pub const COMPONENT_KEY: &str = "__component";

/// One dynamic-zone item, with the discriminant already stripped from `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneEntry {
    /// Uid of the component model this item declared.
    pub component: String,
    /// Item payload, without [`COMPONENT_KEY`].
    pub data: Document,
}

/// A validated nested-field payload, tagged by field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// Non-repeatable component: one object, or `null`.
    Single(Option<Document>),
    /// Repeatable component: ordered list of objects.
    Repeatable(Vec<Document>),
    /// Dynamic zone: ordered list of discriminated objects.
    Zone(Vec<ZoneEntry>),
}

impl ComponentValue {
    /// Number of items carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ComponentValue::Single(doc) => usize::from(doc.is_some()),
            ComponentValue::Repeatable(items) => items.len(),
            ComponentValue::Zone(items) => items.len(),
        }
    }

    /// Whether no items are carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read a caller-supplied primary identifier out of an item payload.
///
/// Items carrying the entity's primary-key field request an in-place update of
/// that component instance; items without one request creation.
#[must_use]
pub fn supplied_id(doc: &Document, primary_key: &str) -> Option<i64> {
    doc.get(primary_key).and_then(serde_json::Value::as_i64)
}
