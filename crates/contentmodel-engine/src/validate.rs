//! Structural validation of nested payload fields.
//!
//! Every component and dynamic-zone value is checked here, once, at the
//! boundary. The component store receives typed
//! [`ComponentValue`]s and never re-checks payload shapes.
//!
//! Count rules: `max` is enforced unconditionally; `min` is enforced only
//! when the field is required or a non-empty value was supplied, so an
//! optional field may be omitted or emptied without tripping its minimum.

use contentmodel_core::{
    AttributeKind, COMPONENT_KEY, ComponentAttr, ComponentValue, Document, DynamicZoneAttr, Error,
    ModelDef, Result, ZoneEntry,
};

/// Validate every nested field present in `payload` against `model`.
///
/// Returns the validated fields in declaration order. With `enforce_required`
/// set (the create path), a required nested field must be present; updates
/// leave absent fields untouched. A required single component rejects an
/// explicit `null` on both paths.
pub fn validate_nested(
    model: &ModelDef,
    payload: &Document,
    enforce_required: bool,
) -> Result<Vec<(String, ComponentValue)>> {
    let mut validated = Vec::new();
    for attr in model.nested_attributes() {
        let supplied = payload.get(&attr.name);
        let value = match (&attr.kind, supplied) {
            (_, None) if !(enforce_required && is_required(&attr.kind)) => continue,
            (_, None) => {
                return Err(Error::validation(&attr.name, "required field is missing"));
            }
            (AttributeKind::Component(c), Some(raw)) if !c.repeatable => {
                validate_single(&attr.name, c, raw)?
            }
            (AttributeKind::Component(c), Some(raw)) => validate_repeatable(&attr.name, c, raw)?,
            (AttributeKind::DynamicZone(z), Some(raw)) => {
                validate_dynamic_zone(&attr.name, z, raw)?
            }
            (AttributeKind::Scalar(_), _) => continue,
        };
        validated.push((attr.name.clone(), value));
    }
    Ok(validated)
}

fn is_required(kind: &AttributeKind) -> bool {
    match kind {
        AttributeKind::Component(c) => c.required,
        AttributeKind::DynamicZone(z) => z.required,
        AttributeKind::Scalar(_) => false,
    }
}

fn validate_single(
    field: &str,
    attr: &ComponentAttr,
    raw: &serde_json::Value,
) -> Result<ComponentValue> {
    match raw {
        serde_json::Value::Null => {
            // A supplied null always clears the instance, so a required field
            // rejects it on updates too; only absence is patch-exempt.
            if attr.required {
                return Err(Error::validation(field, "required component is null"));
            }
            Ok(ComponentValue::Single(None))
        }
        serde_json::Value::Object(map) => Ok(ComponentValue::Single(Some(map.clone()))),
        other => Err(Error::validation(
            field,
            format!("expected an object, got {other}"),
        )),
    }
}

fn validate_repeatable(
    field: &str,
    attr: &ComponentAttr,
    raw: &serde_json::Value,
) -> Result<ComponentValue> {
    let serde_json::Value::Array(raw_items) = raw else {
        return Err(Error::validation(
            field,
            format!("expected an array, got {raw}"),
        ));
    };
    let mut items = Vec::with_capacity(raw_items.len());
    for item in raw_items {
        let serde_json::Value::Object(map) = item else {
            return Err(Error::validation(
                field,
                format!("expected an array of objects, got item {item}"),
            ));
        };
        items.push(map.clone());
    }
    check_counts(field, items.len(), attr.required, attr.min, attr.max)?;
    Ok(ComponentValue::Repeatable(items))
}

fn validate_dynamic_zone(
    field: &str,
    attr: &DynamicZoneAttr,
    raw: &serde_json::Value,
) -> Result<ComponentValue> {
    let serde_json::Value::Array(raw_items) = raw else {
        return Err(Error::validation(
            field,
            format!("expected an array, got {raw}"),
        ));
    };
    let mut entries = Vec::with_capacity(raw_items.len());
    for item in raw_items {
        let serde_json::Value::Object(map) = item else {
            return Err(Error::validation(
                field,
                format!("expected an array of objects, got item {item}"),
            ));
        };
        let Some(component) = map.get(COMPONENT_KEY).and_then(serde_json::Value::as_str) else {
            return Err(Error::validation(
                field,
                format!("zone item is missing the {COMPONENT_KEY} discriminant"),
            ));
        };
        if !attr.components.iter().any(|c| c == component) {
            return Err(Error::validation(
                field,
                format!("component {component} is not allowed in this zone"),
            ));
        }
        let mut data = map.clone();
        data.remove(COMPONENT_KEY);
        entries.push(ZoneEntry {
            component: component.to_string(),
            data,
        });
    }
    check_counts(field, entries.len(), attr.required, attr.min, attr.max)?;
    Ok(ComponentValue::Zone(entries))
}

fn check_counts(
    field: &str,
    len: usize,
    required: bool,
    min: Option<u32>,
    max: Option<u32>,
) -> Result<()> {
    if let Some(max) = max {
        if len > max as usize {
            return Err(Error::validation(
                field,
                format!("holds {len} items, above the maximum of {max}"),
            ));
        }
    }
    if let Some(min) = min {
        if (required || len > 0) && len < min as usize {
            return Err(Error::validation(
                field,
                format!("holds {len} items, below the minimum of {min}"),
            ));
        }
    }
    Ok(())
}
