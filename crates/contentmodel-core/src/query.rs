//! Backend-agnostic query description.
//!
//! A [`Query`] is the predicate description the engine hands to a backend:
//! filtering, sorting, offset/limit, and raw-predicate injection. Backends
//! either evaluate it directly (the memory backend) or render it to SQL
//! (`contentmodel-query`).

use crate::value::Value;

/// SQL dialect of a backend, driving placeholder style and full-text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL: `$1` placeholders, `to_tsvector` full-text.
    #[default]
    Postgres,
    /// SQLite: `?1` placeholders, `LIKE` full-text fallback.
    Sqlite,
    /// MySQL: `?` placeholders, `MATCH ... AGAINST` full-text.
    Mysql,
}

impl Dialect {
    /// Placeholder for the `n`-th parameter (1-based).
    #[must_use]
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::Sqlite => format!("?{n}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Whether the dialect reliably supports opening a transaction inside an
    /// already-open scope. Callers reuse the outer scope when it does not.
    #[must_use]
    pub fn supports_nested_transactions(&self) -> bool {
        !matches!(self, Dialect::Mysql)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Comparison operators supported by filter translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (numeric widening applies).
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Case-insensitive substring.
    Contains,
    /// Negated case-insensitive substring.
    NotContains,
    /// Case-sensitive substring.
    ContainsSensitive,
    /// NULL test; the value is `Bool(true)` for IS NULL, `Bool(false)` for IS NOT NULL.
    Null,
}

/// A backend-agnostic predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field/operator/value comparison.
    Compare {
        /// Column name.
        field: String,
        /// Operator.
        op: CompareOp,
        /// Right-hand value.
        value: Value,
    },
    /// Set membership.
    In {
        /// Column name.
        field: String,
        /// Candidate values.
        values: Vec<Value>,
        /// Whether the membership test is negated.
        negated: bool,
    },
    /// Conjunction.
    And(Vec<Predicate>),
    /// Disjunction.
    Or(Vec<Predicate>),
    /// Dialect-dispatched full-text match over the given columns.
    FullText {
        /// Columns to match.
        fields: Vec<String>,
        /// Free-text query.
        query: String,
    },
    /// Raw predicate injection: pre-rendered SQL with bound parameters.
    /// Only meaningful to SQL backends.
    Raw {
        /// SQL fragment.
        sql: String,
        /// Bound parameters, in order.
        params: Vec<Value>,
    },
}

impl Predicate {
    /// Comparison predicate.
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Membership predicate.
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::In {
            field: field.into(),
            values,
            negated: false,
        }
    }

    /// Conjoin with another predicate, flattening nested `And`s.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut preds) => {
                preds.push(other);
                Predicate::And(preds)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Disjoin with another predicate, flattening nested `Or`s.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut preds) => {
                preds.push(other);
                Predicate::Or(preds)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }
}

/// A complete query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Table (collection) name.
    pub table: String,
    /// Optional predicate; `None` selects everything.
    pub predicate: Option<Predicate>,
    /// Sort clauses, applied in order.
    pub sort: Vec<(String, SortOrder)>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Maximum rows to return.
    pub limit: Option<u64>,
}

impl Query {
    /// Query selecting everything from `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicate: None,
            sort: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    /// AND a predicate into the query.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Append a sort clause.
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    /// Skip the first `offset` rows.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Return at most `limit` rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_per_dialect() {
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Sqlite.placeholder(3), "?3");
        assert_eq!(Dialect::Mysql.placeholder(3), "?");
    }

    #[test]
    fn test_and_flattens() {
        let p = Predicate::eq("a", 1)
            .and(Predicate::eq("b", 2))
            .and(Predicate::eq("c", 3));
        let Predicate::And(parts) = p else {
            panic!("expected And");
        };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_query_filter_merges_with_and() {
        let q = Query::new("articles")
            .filter(Predicate::eq("id", 1))
            .filter(Predicate::eq("title", "A"));
        assert!(matches!(q.predicate, Some(Predicate::And(_))));
    }

    #[test]
    fn test_nested_transaction_support() {
        assert!(Dialect::Postgres.supports_nested_transactions());
        assert!(!Dialect::Mysql.supports_nested_transactions());
    }
}
