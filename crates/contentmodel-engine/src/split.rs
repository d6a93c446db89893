//! Attribute splitting.
//!
//! An incoming payload mixes scalar columns, relation aliases, nested
//! component fields, and arbitrary unknown keys. The splitter routes each key
//! to the layer that owns it; unknown keys are dropped rather than rejected.

use contentmodel_core::{AttributeKind, Document, ModelDef, Result, Row};

/// Extract the relation aliases from a payload.
///
/// Returns the subset of `payload` whose keys are declared associations on
/// `model`, preserving the supplied reference values untouched.
#[must_use]
pub fn pick_relations(model: &ModelDef, payload: &Document) -> Document {
    payload
        .iter()
        .filter(|(key, _)| model.is_relation(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Extract and coerce the scalar columns from a payload.
///
/// Only declared scalar attributes survive: relations, nested fields,
/// timestamp columns, the primary key, and unknown keys are all skipped.
/// A value that does not match its declared kind fails validation.
pub fn select_attributes(model: &ModelDef, payload: &Document) -> Result<Row> {
    let mut row = Row::new();
    for (key, value) in payload {
        if key == &model.primary_key || model.is_timestamp(key) {
            continue;
        }
        let Some(attr) = model.attr(key) else {
            continue;
        };
        let AttributeKind::Scalar(kind) = &attr.kind else {
            continue;
        };
        row.push(key.clone(), kind.coerce(key, value)?);
    }
    Ok(row)
}
