//! Component persistence through the polymorphic join table.
//!
//! Each component instance lives as a plain row in its component model's own
//! collection. The owning entity is linked to it through the model's join
//! table, one record per instance:
//!
//! | column           | meaning                                           |
//! |------------------|---------------------------------------------------|
//! | `<entity_fk>`    | owning entity id (column name from the model)     |
//! | `component_type` | component collection name, the type discriminant  |
//! | `component_id`   | row id inside that collection                     |
//! | `field`          | which attribute on the entity owns the instance   |
//! | `order`          | 1-based position within the field                 |
//!
//! The `(component_type, component_id)` pair is the only way to address an
//! instance; ids alone are not unique across component collections.

use std::collections::HashMap;

use asupersync::{Cx, Outcome};
use contentmodel_core::{
    AttributeKind, COMPONENT_KEY, ComponentValue, Document, Error, ModelDef, ModelRegistry,
    Predicate, Query, Result, Row, SortOrder, StoreOps, Value, row_to_document, supplied_id,
    try_outcome,
};

use crate::split::select_attributes;
use crate::try_result;

/// Join-record column holding the component collection name.
pub const COMPONENT_TYPE_COLUMN: &str = "component_type";
/// Join-record column holding the component row id.
pub const COMPONENT_ID_COLUMN: &str = "component_id";
/// Join-record column holding the owning attribute name.
pub const FIELD_COLUMN: &str = "field";
/// Join-record column holding the 1-based position within the field.
pub const ORDER_COLUMN: &str = "order";

/// The items carried by a validated field, each with its component model uid.
fn flatten_items<'a>(
    model: &ModelDef,
    field: &str,
    value: &'a ComponentValue,
) -> Result<Vec<(String, &'a Document)>> {
    let uid = match model.attr(field).map(|a| &a.kind) {
        Some(AttributeKind::Component(c)) => Some(c.component.clone()),
        Some(AttributeKind::DynamicZone(_)) => None,
        _ => {
            return Err(Error::backend(format!(
                "field {field} is not a nested attribute of {}",
                model.uid
            )));
        }
    };
    Ok(match value {
        ComponentValue::Single(doc) => doc
            .iter()
            .filter_map(|d| uid.clone().map(|u| (u, d)))
            .collect(),
        ComponentValue::Repeatable(items) => items
            .iter()
            .filter_map(|d| uid.clone().map(|u| (u, d)))
            .collect(),
        ComponentValue::Zone(entries) => entries
            .iter()
            .map(|e| (e.component.clone(), &e.data))
            .collect(),
    })
}

fn join_record(
    entity_fk: &str,
    entity_id: i64,
    component_type: &str,
    component_id: i64,
    field: &str,
    order: usize,
) -> Row {
    Row::new()
        .with(entity_fk, Value::BigInt(entity_id))
        .with(COMPONENT_TYPE_COLUMN, Value::from(component_type))
        .with(COMPONENT_ID_COLUMN, Value::BigInt(component_id))
        .with(FIELD_COLUMN, Value::from(field))
        .with(ORDER_COLUMN, Value::BigInt(order as i64))
}

/// Predicate addressing the join records of one entity field.
fn field_records(entity_fk: &str, entity_id: i64, field: &str) -> Predicate {
    Predicate::eq(entity_fk, entity_id).and(Predicate::eq(FIELD_COLUMN, field))
}

/// Persist all validated nested fields of a freshly created entity.
pub async fn create_components<O: StoreOps>(
    cx: &Cx,
    ops: &O,
    registry: &ModelRegistry,
    model: &ModelDef,
    entity_id: i64,
    nested: &[(String, ComponentValue)],
) -> Outcome<(), Error> {
    if nested.is_empty() {
        return Outcome::Ok(());
    }
    let join = try_result!(model.join()).clone();
    for (field, value) in nested {
        let items = try_result!(flatten_items(model, field, value));
        for (position, (uid, doc)) in items.iter().enumerate() {
            let component_model = try_result!(registry.get(uid));
            let row = try_result!(select_attributes(&component_model, doc));
            let component_id =
                try_outcome!(ops.insert(cx, &component_model.collection_name, row).await);
            let record = join_record(
                &join.entity_fk,
                entity_id,
                &component_model.collection_name,
                component_id,
                field,
                position + 1,
            );
            try_outcome!(ops.insert(cx, &join.table, record).await);
        }
        tracing::debug!(model = %model.uid, field = %field, items = items.len(), "created components");
    }
    Outcome::Ok(())
}

/// Reconcile the validated nested fields of an existing entity.
///
/// Items carrying a primary identifier update that instance in place; the
/// identifier must belong to this entity's existing records for the field's
/// join table, otherwise the whole operation fails with a referential error.
/// Items without one are created. Existing instances absent from the payload
/// are deleted, join record included. A payload may name each instance at
/// most once; a repeat fails validation, keeping positions dense.
pub async fn update_components<O: StoreOps>(
    cx: &Cx,
    ops: &O,
    registry: &ModelRegistry,
    model: &ModelDef,
    entity_id: i64,
    nested: &[(String, ComponentValue)],
) -> Outcome<(), Error> {
    if nested.is_empty() {
        return Outcome::Ok(());
    }
    let join = try_result!(model.join()).clone();
    for (field, value) in nested {
        let existing = try_outcome!(
            load_join_records(cx, ops, &join.table, &join.entity_fk, entity_id, field).await
        );
        let mut retained: Vec<(i64, String)> = Vec::new();

        let items = try_result!(flatten_items(model, field, value));
        for (position, (uid, doc)) in items.iter().enumerate() {
            let component_model = try_result!(registry.get(uid));
            let component_type = component_model.collection_name.clone();
            match supplied_id(doc, &component_model.primary_key) {
                Some(component_id) => {
                    if retained.contains(&(component_id, component_type.clone())) {
                        return Outcome::Err(Error::validation(
                            field,
                            format!(
                                "component {component_type}:{component_id} appears more than once"
                            ),
                        ));
                    }
                    let known = existing
                        .iter()
                        .any(|(id, ty)| *id == component_id && *ty == component_type);
                    if !known {
                        return Outcome::Err(Error::relation(
                            field,
                            format!(
                                "component {component_type}:{component_id} does not belong to this entity"
                            ),
                        ));
                    }
                    let values = try_result!(select_attributes(&component_model, doc));
                    if !values.is_empty() {
                        try_outcome!(
                            ops.update(
                                cx,
                                &component_model.collection_name,
                                &Predicate::eq(component_model.primary_key.as_str(), component_id),
                                values,
                            )
                            .await
                        );
                    }
                    let target = field_records(&join.entity_fk, entity_id, field)
                        .and(Predicate::eq(COMPONENT_TYPE_COLUMN, component_type.as_str()))
                        .and(Predicate::eq(COMPONENT_ID_COLUMN, component_id));
                    let reorder =
                        Row::new().with(ORDER_COLUMN, Value::BigInt(position as i64 + 1));
                    try_outcome!(ops.update(cx, &join.table, &target, reorder).await);
                    retained.push((component_id, component_type));
                }
                None => {
                    let row = try_result!(select_attributes(&component_model, doc));
                    let component_id =
                        try_outcome!(ops.insert(cx, &component_model.collection_name, row).await);
                    let record = join_record(
                        &join.entity_fk,
                        entity_id,
                        &component_type,
                        component_id,
                        field,
                        position + 1,
                    );
                    try_outcome!(ops.insert(cx, &join.table, record).await);
                    retained.push((component_id, component_type));
                }
            }
        }

        // Stale instances: present before, absent from the payload now.
        let mut stale: HashMap<String, Vec<Value>> = HashMap::new();
        for (component_id, component_type) in existing {
            if !retained.contains(&(component_id, component_type.clone())) {
                stale
                    .entry(component_type)
                    .or_default()
                    .push(Value::BigInt(component_id));
            }
        }
        for (component_type, ids) in stale {
            if let Some(component_model) = registry.component_by_collection(&component_type) {
                try_outcome!(
                    ops.delete(
                        cx,
                        &component_model.collection_name,
                        &Predicate::in_values(component_model.primary_key.as_str(), ids.clone()),
                    )
                    .await
                );
            }
            let target = field_records(&join.entity_fk, entity_id, field)
                .and(Predicate::eq(COMPONENT_TYPE_COLUMN, component_type.as_str()))
                .and(Predicate::in_values(COMPONENT_ID_COLUMN, ids));
            try_outcome!(ops.delete(cx, &join.table, &target).await);
        }
        tracing::debug!(model = %model.uid, field = %field, kept = retained.len(), "reconciled components");
    }
    Outcome::Ok(())
}

/// Delete every component instance owned by an entity, join records included.
pub async fn delete_components<O: StoreOps>(
    cx: &Cx,
    ops: &O,
    registry: &ModelRegistry,
    model: &ModelDef,
    entity_id: i64,
) -> Outcome<(), Error> {
    let Some(join) = model.join_table.clone() else {
        return Outcome::Ok(());
    };
    let owned = Predicate::eq(join.entity_fk.as_str(), entity_id);
    let query = Query::new(join.table.clone()).filter(owned.clone());
    let records = try_outcome!(ops.select(cx, &query).await);

    let mut by_type: HashMap<String, Vec<Value>> = HashMap::new();
    for record in &records {
        let component_type = try_result!(record.get_named::<String>(COMPONENT_TYPE_COLUMN));
        let component_id = try_result!(record.get_named::<i64>(COMPONENT_ID_COLUMN));
        by_type
            .entry(component_type)
            .or_default()
            .push(Value::BigInt(component_id));
    }
    for (component_type, ids) in by_type {
        if let Some(component_model) = registry.component_by_collection(&component_type) {
            try_outcome!(
                ops.delete(
                    cx,
                    &component_model.collection_name,
                    &Predicate::in_values(component_model.primary_key.as_str(), ids),
                )
                .await
            );
        }
    }
    try_outcome!(ops.delete(cx, &join.table, &owned).await);
    Outcome::Ok(())
}

/// Materialize every nested field of `entity` from storage, in join order.
///
/// Dynamic-zone items get their discriminant key restored, carrying the
/// component model uid.
pub async fn load_components<O: StoreOps>(
    cx: &Cx,
    ops: &O,
    registry: &ModelRegistry,
    model: &ModelDef,
    entity: &mut Document,
) -> Outcome<(), Error> {
    let Some(join) = model.join_table.clone() else {
        return Outcome::Ok(());
    };
    let Some(entity_id) = entity
        .get(&model.primary_key)
        .and_then(serde_json::Value::as_i64)
    else {
        return Outcome::Ok(());
    };

    for attr in model.nested_attributes() {
        let records = try_outcome!(
            load_join_records(cx, ops, &join.table, &join.entity_fk, entity_id, &attr.name).await
        );
        let mut items = Vec::with_capacity(records.len());
        for (component_id, component_type) in records {
            let Some(component_model) = registry.component_by_collection(&component_type) else {
                return Outcome::Err(Error::backend(format!(
                    "join record references unknown component collection {component_type}"
                )));
            };
            let query = Query::new(component_model.collection_name.clone())
                .filter(Predicate::eq(
                    component_model.primary_key.as_str(),
                    component_id,
                ))
                .limit(1);
            let rows = try_outcome!(ops.select(cx, &query).await);
            let Some(row) = rows.into_iter().next() else {
                continue;
            };
            let mut doc = row_to_document(&row);
            if matches!(attr.kind, AttributeKind::DynamicZone(_)) {
                doc.insert(
                    COMPONENT_KEY.to_string(),
                    serde_json::Value::String(component_model.uid.clone()),
                );
            }
            items.push(serde_json::Value::Object(doc));
        }
        let materialized = match &attr.kind {
            AttributeKind::Component(c) if !c.repeatable => {
                items.into_iter().next().unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Array(items),
        };
        entity.insert(attr.name.clone(), materialized);
    }
    Outcome::Ok(())
}

/// Load one field's join records in position order as `(component_id, type)`.
async fn load_join_records<O: StoreOps>(
    cx: &Cx,
    ops: &O,
    table: &str,
    entity_fk: &str,
    entity_id: i64,
    field: &str,
) -> Outcome<Vec<(i64, String)>, Error> {
    let query = Query::new(table)
        .filter(field_records(entity_fk, entity_id, field))
        .sort(ORDER_COLUMN, SortOrder::Asc);
    let rows = try_outcome!(ops.select(cx, &query).await);
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let component_id = try_result!(row.get_named::<i64>(COMPONENT_ID_COLUMN));
        let component_type = try_result!(row.get_named::<String>(COMPONENT_TYPE_COLUMN));
        records.push((component_id, component_type));
    }
    Outcome::Ok(records)
}
