//! Free-text search predicate construction.
//!
//! Search unions (logical OR) a full-text match over every string/text
//! attribute with exact matches on numeric attributes when the query parses
//! as a number, and on boolean attributes when it is `"true"`/`"false"`.

use contentmodel_core::{ModelDef, Predicate, Query, ScalarKind, Value};

use crate::params::FilterParams;

/// Build the OR-union search predicate for `query` over `model`'s searchable
/// scalar attributes.
///
/// With no searchable attribute and an unparseable query the result is an
/// empty disjunction, which matches nothing.
#[must_use]
pub fn search_predicate(model: &ModelDef, query: &str) -> Predicate {
    let mut branches = Vec::new();

    let text_fields: Vec<String> = model
        .scalar_attributes()
        .filter(|(_, kind)| kind.is_searchable_text())
        .map(|(name, _)| name.to_string())
        .collect();
    if !text_fields.is_empty() {
        branches.push(Predicate::FullText {
            fields: text_fields,
            query: query.to_string(),
        });
    }

    if let Ok(number) = query.parse::<f64>() {
        for (name, kind) in model.scalar_attributes() {
            let value = match kind {
                ScalarKind::Integer if number.fract() == 0.0 => Value::BigInt(number as i64),
                ScalarKind::Float => Value::Double(number),
                _ => continue,
            };
            branches.push(Predicate::eq(name, value));
        }
    }

    if let Ok(flag) = query.parse::<bool>() {
        for (name, kind) in model.scalar_attributes() {
            if kind == ScalarKind::Boolean {
                branches.push(Predicate::eq(name, flag));
            }
        }
    }

    Predicate::Or(branches)
}

/// Build the full search query: search predicate merged with the sort,
/// offset, and limit carried by `params`. The free-text string comes from
/// `params.q`; an absent or empty query matches nothing.
#[must_use]
pub fn search_query(model: &ModelDef, params: &FilterParams) -> Query {
    let predicate = match params.q.as_deref() {
        Some(text) if !text.is_empty() => search_predicate(model, text),
        _ => Predicate::Or(Vec::new()),
    };
    let mut query = Query::new(model.collection_name.clone()).filter(predicate);
    for (field, order) in &params.sort {
        query = query.sort(field.clone(), *order);
    }
    if let Some(start) = params.start {
        query = query.offset(start);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentmodel_core::AttributeDef;

    fn model() -> ModelDef {
        ModelDef::new("application::article", "articles")
            .attribute(AttributeDef::string("title"))
            .attribute(AttributeDef::text("body"))
            .attribute(AttributeDef::integer("views"))
            .attribute(AttributeDef::float("score"))
            .attribute(AttributeDef::boolean("published"))
            .attribute(AttributeDef::json("meta"))
    }

    #[test]
    fn test_text_only_query() {
        let predicate = search_predicate(&model(), "hello");
        let Predicate::Or(branches) = predicate else {
            panic!("expected Or");
        };
        assert_eq!(branches.len(), 1);
        assert!(matches!(&branches[0], Predicate::FullText { fields, .. }
            if fields == &vec!["title".to_string(), "body".to_string()]));
    }

    #[test]
    fn test_numeric_query_unions_numeric_attributes() {
        let predicate = search_predicate(&model(), "42");
        let Predicate::Or(branches) = predicate else {
            panic!("expected Or");
        };
        // full-text over title/body, integer eq on views, float eq on score
        assert_eq!(branches.len(), 3);
        assert!(branches.iter().any(|b| matches!(b,
            Predicate::Compare { field, value: Value::BigInt(42), .. } if field == "views")));
        assert!(branches.iter().any(|b| matches!(b,
            Predicate::Compare { field, value: Value::Double(v), .. } if field == "score" && *v == 42.0)));
    }

    #[test]
    fn test_fractional_query_skips_integers() {
        let predicate = search_predicate(&model(), "1.5");
        let Predicate::Or(branches) = predicate else {
            panic!("expected Or");
        };
        assert!(!branches.iter().any(|b| matches!(b,
            Predicate::Compare { field, .. } if field == "views")));
        assert!(branches.iter().any(|b| matches!(b,
            Predicate::Compare { field, .. } if field == "score")));
    }

    #[test]
    fn test_boolean_query() {
        let predicate = search_predicate(&model(), "true");
        let Predicate::Or(branches) = predicate else {
            panic!("expected Or");
        };
        assert!(branches.iter().any(|b| matches!(b,
            Predicate::Compare { field, value: Value::Bool(true), .. } if field == "published")));
    }

    #[test]
    fn test_no_searchable_fields_matches_nothing() {
        let bare = ModelDef::new("application::counter", "counters")
            .attribute(AttributeDef::json("state"));
        let predicate = search_predicate(&bare, "anything");
        assert_eq!(predicate, Predicate::Or(vec![]));
    }

    #[test]
    fn test_absent_or_empty_query_matches_nothing() {
        let absent = search_query(&model(), &FilterParams::new());
        assert_eq!(absent.predicate, Some(Predicate::Or(vec![])));

        let mut params = FilterParams::new();
        params.q = Some(String::new());
        let empty = search_query(&model(), &params);
        assert_eq!(empty.predicate, Some(Predicate::Or(vec![])));
    }

    #[test]
    fn test_search_query_carries_pagination() {
        let mut params = FilterParams::new().paginate(5, 10);
        params.q = Some("42".into());
        let query = search_query(&model(), &params);
        assert_eq!(query.offset, Some(5));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.table, "articles");
    }
}
