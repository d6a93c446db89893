//! REST-style filter parameter translation.
//!
//! Converts query-string style parameters into a [`Query`]:
//!
//! - `_start` / `_limit` — pagination
//! - `_sort=field:ASC,other:DESC` — sort clauses
//! - `_q` — free-text search query (consumed by the search path)
//! - `field=value` — equality
//! - `field_op=value` with `ne|lt|lte|gt|gte|in|nin|contains|ncontains|containss|null`
//!
//! Scalar values are parsed leniently: integers, floats, and booleans are
//! recognized, everything else stays text.

use contentmodel_core::{CompareOp, Predicate, Query, SortOrder, Value};

/// One parsed filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field/operator/value comparison.
    Compare {
        /// Field name.
        field: String,
        /// Operator.
        op: CompareOp,
        /// Parsed value.
        value: Value,
    },
    /// Set membership (`_in` / `_nin`).
    In {
        /// Field name.
        field: String,
        /// Candidate values.
        values: Vec<Value>,
        /// Whether the membership test is negated.
        negated: bool,
    },
}

impl Filter {
    fn to_predicate(&self) -> Predicate {
        match self {
            Filter::Compare { field, op, value } => Predicate::Compare {
                field: field.clone(),
                op: *op,
                value: value.clone(),
            },
            Filter::In {
                field,
                values,
                negated,
            } => Predicate::In {
                field: field.clone(),
                values: values.clone(),
                negated: *negated,
            },
        }
    }
}

/// Parsed REST-style query parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterParams {
    /// Rows to skip (`_start`).
    pub start: Option<u64>,
    /// Maximum rows (`_limit`).
    pub limit: Option<u64>,
    /// Sort clauses (`_sort`).
    pub sort: Vec<(String, SortOrder)>,
    /// Free-text search query (`_q`).
    pub q: Option<String>,
    /// Filter clauses.
    pub filters: Vec<Filter>,
}

/// Operator suffixes, matched against the end of a parameter key.
const OPERATOR_SUFFIXES: &[(&str, CompareOp)] = &[
    ("_containss", CompareOp::ContainsSensitive),
    ("_ncontains", CompareOp::NotContains),
    ("_contains", CompareOp::Contains),
    ("_null", CompareOp::Null),
    ("_lte", CompareOp::Lte),
    ("_gte", CompareOp::Gte),
    ("_eq", CompareOp::Eq),
    ("_ne", CompareOp::Ne),
    ("_lt", CompareOp::Lt),
    ("_gt", CompareOp::Gt),
];

/// Parse a scalar parameter value: integer, float, boolean, or text.
fn parse_scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::BigInt(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Double(f);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Text(raw.to_string()),
    }
}

impl FilterParams {
    /// Empty parameter set: no filters, no pagination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from key/value pairs as they appear in a query string.
    ///
    /// Unknown `_`-prefixed keys are ignored; everything else becomes a
    /// filter clause.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::new();
        for (key, raw) in pairs {
            match key {
                "_start" => params.start = raw.parse().ok(),
                "_limit" => params.limit = raw.parse().ok(),
                "_q" => params.q = Some(raw.to_string()),
                "_sort" => {
                    for clause in raw.split(',').filter(|c| !c.is_empty()) {
                        let (field, order) = match clause.split_once(':') {
                            Some((f, dir)) if dir.eq_ignore_ascii_case("desc") => {
                                (f, SortOrder::Desc)
                            }
                            Some((f, _)) => (f, SortOrder::Asc),
                            None => (clause, SortOrder::Asc),
                        };
                        params.sort.push((field.to_string(), order));
                    }
                }
                _ if key.starts_with('_') => {}
                _ => params.push_pair(key, raw),
            }
        }
        params
    }

    fn push_pair(&mut self, key: &str, raw: &str) {
        if let Some(field) = key.strip_suffix("_in") {
            self.filters.push(Filter::In {
                field: field.to_string(),
                values: raw.split(',').map(parse_scalar).collect(),
                negated: false,
            });
            return;
        }
        if let Some(field) = key.strip_suffix("_nin") {
            self.filters.push(Filter::In {
                field: field.to_string(),
                values: raw.split(',').map(parse_scalar).collect(),
                negated: true,
            });
            return;
        }
        for (suffix, op) in OPERATOR_SUFFIXES {
            if let Some(field) = key.strip_suffix(suffix) {
                if field.is_empty() {
                    break;
                }
                let value = if *op == CompareOp::Null {
                    Value::Bool(raw != "false")
                } else {
                    parse_scalar(raw)
                };
                self.filters.push(Filter::Compare {
                    field: field.to_string(),
                    op: *op,
                    value,
                });
                return;
            }
        }
        // Bare key: equality.
        self.filters.push(Filter::Compare {
            field: key.to_string(),
            op: CompareOp::Eq,
            value: parse_scalar(raw),
        });
    }

    /// Programmatic equality filter.
    #[must_use]
    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Compare {
            field: field.into(),
            op: CompareOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Programmatic pagination.
    #[must_use]
    pub fn paginate(mut self, start: u64, limit: u64) -> Self {
        self.start = Some(start);
        self.limit = Some(limit);
        self
    }

    /// When the parameters are exactly one equality filter on `primary_key`,
    /// return the targeted identifier. Drives the single-entity delete path.
    #[must_use]
    pub fn exact_primary_key(&self, primary_key: &str) -> Option<i64> {
        match self.filters.as_slice() {
            [
                Filter::Compare {
                    field,
                    op: CompareOp::Eq,
                    value,
                },
            ] if field == primary_key => value.as_i64(),
            _ => None,
        }
    }

    /// Translate into a [`Query`] over `table`.
    #[must_use]
    pub fn to_query(&self, table: &str) -> Query {
        let mut query = Query::new(table);
        for filter in &self.filters {
            query = query.filter(filter.to_predicate());
        }
        for (field, order) in &self.sort {
            query = query.sort(field.clone(), *order);
        }
        if let Some(start) = self.start {
            query = query.offset(start);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}
