//! In-memory predicate evaluation.
//!
//! Mirrors the SQL rendering semantics: `eq`/`ne` widen numerics, substring
//! operators are case-insensitive unless marked sensitive, full-text is a
//! case-insensitive substring match over the listed columns, and an empty
//! `IN` list matches nothing.

use contentmodel_core::{CompareOp, Predicate, Row, SortOrder, Value};

/// Whether `row` satisfies `predicate`.
pub(crate) fn matches(predicate: &Predicate, row: &Row) -> bool {
    match predicate {
        Predicate::Compare { field, op, value } => {
            let actual = row.named(field).unwrap_or(&Value::Null);
            compare(actual, *op, value)
        }
        Predicate::In {
            field,
            values,
            negated,
        } => {
            let actual = row.named(field).unwrap_or(&Value::Null);
            let found = values.iter().any(|v| actual.loose_eq(v));
            found != *negated
        }
        Predicate::And(parts) => parts.iter().all(|p| matches(p, row)),
        Predicate::Or(parts) => parts.iter().any(|p| matches(p, row)),
        Predicate::FullText { fields, query } => {
            let needle = query.to_lowercase();
            fields.iter().any(|field| {
                row.named(field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        }
        Predicate::Raw { sql, .. } => {
            tracing::warn!(sql = %sql, "raw predicate is not evaluable in memory, matching nothing");
            false
        }
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => actual.loose_eq(expected),
        CompareOp::Ne => !actual.loose_eq(expected),
        CompareOp::Null => expected.as_bool().unwrap_or(true) == actual.is_null(),
        CompareOp::Lt | CompareOp::Lte | CompareOp::Gt | CompareOp::Gte => {
            if actual.is_null() || expected.is_null() {
                return false;
            }
            let ordering = actual.compare(expected);
            match op {
                CompareOp::Lt => ordering.is_lt(),
                CompareOp::Lte => ordering.is_le(),
                CompareOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }
        }
        CompareOp::Contains | CompareOp::NotContains | CompareOp::ContainsSensitive => {
            let (Some(haystack), Some(needle)) = (actual.as_str(), expected.as_str()) else {
                return false;
            };
            match op {
                CompareOp::ContainsSensitive => haystack.contains(needle),
                CompareOp::Contains => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => !haystack.to_lowercase().contains(&needle.to_lowercase()),
            }
        }
    }
}

/// Apply the query's sort clauses in order.
pub(crate) fn sort_rows(rows: &mut [Row], sort: &[(String, SortOrder)]) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for (field, order) in sort {
            let left = a.named(field).unwrap_or(&Value::Null);
            let right = b.named(field).unwrap_or(&Value::Null);
            let ordering = match order {
                SortOrder::Asc => left.compare(right),
                SortOrder::Desc => right.compare(left),
            };
            if !ordering.is_eq() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

/// Apply offset and limit to a sorted result set.
pub(crate) fn apply_window(rows: Vec<Row>, offset: Option<u64>, limit: Option<u64>) -> Vec<Row> {
    let skip = offset.unwrap_or(0) as usize;
    let take = limit.map_or(usize::MAX, |l| l as usize);
    rows.into_iter().skip(skip).take(take).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, views: i64) -> Row {
        Row::new()
            .with("title", Value::from(title))
            .with("views", Value::BigInt(views))
    }

    #[test]
    fn test_eq_widens_numerics() {
        let p = Predicate::eq("views", Value::Double(3.0));
        assert!(matches(&p, &row("a", 3)));
        assert!(!matches(&p, &row("a", 4)));
    }

    #[test]
    fn test_missing_column_reads_as_null() {
        let p = Predicate::compare("missing", CompareOp::Null, true);
        assert!(matches(&p, &row("a", 1)));
        let lt = Predicate::compare("missing", CompareOp::Lt, 5);
        assert!(!matches(&lt, &row("a", 1)));
    }

    #[test]
    fn test_contains_case_handling() {
        let insensitive = Predicate::compare("title", CompareOp::Contains, "HELLO");
        assert!(matches(&insensitive, &row("say hello", 1)));
        let sensitive = Predicate::compare("title", CompareOp::ContainsSensitive, "HELLO");
        assert!(!matches(&sensitive, &row("say hello", 1)));
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let p = Predicate::in_values("views", vec![]);
        assert!(!matches(&p, &row("a", 1)));
        let nin = Predicate::In {
            field: "views".into(),
            values: vec![],
            negated: true,
        };
        assert!(matches(&nin, &row("a", 1)));
    }

    #[test]
    fn test_full_text_spans_columns() {
        let p = Predicate::FullText {
            fields: vec!["title".into(), "body".into()],
            query: "Rust".into(),
        };
        assert!(matches(&p, &row("learning rust", 1)));
        assert!(!matches(&p, &row("learning go", 1)));
    }

    #[test]
    fn test_sort_desc_then_window() {
        let mut rows = vec![row("a", 1), row("b", 3), row("c", 2)];
        sort_rows(&mut rows, &[("views".to_string(), SortOrder::Desc)]);
        let windowed = apply_window(rows, Some(1), Some(1));
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].get_named::<i64>("views").unwrap(), 2);
    }
}
