//! SQL rendering for [`Query`] descriptions.
//!
//! Placeholder style and full-text form follow the backend dialect:
//!
//! | dialect  | placeholder | full-text |
//! |----------|-------------|-----------|
//! | Postgres | `$n`        | `to_tsvector('simple', ...) @@ plainto_tsquery($n)` |
//! | SQLite   | `?n`        | `LOWER(col) LIKE ?n` per column |
//! | MySQL    | `?`         | `MATCH (cols) AGAINST (? IN BOOLEAN MODE)` |

use contentmodel_core::{CompareOp, Dialect, Predicate, Query, SortOrder, Value};

/// Quote an identifier with double quotes (Postgres/SQLite).
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote an identifier with backticks (MySQL).
#[must_use]
pub fn quote_ident_mysql(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

fn quote(dialect: Dialect, ident: &str) -> String {
    match dialect {
        Dialect::Mysql => quote_ident_mysql(ident),
        _ => quote_ident(ident),
    }
}

/// Render a `SELECT *` statement for the query.
#[must_use]
pub fn to_sql(query: &Query, dialect: Dialect) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let mut sql = format!("SELECT * FROM {}", quote(dialect, &query.table));

    if let Some(predicate) = &query.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&render_predicate(predicate, dialect, &mut params));
    }

    if !query.sort.is_empty() {
        let clauses: Vec<String> = query
            .sort
            .iter()
            .map(|(field, order)| {
                let dir = match order {
                    SortOrder::Asc => "ASC",
                    SortOrder::Desc => "DESC",
                };
                format!("{} {dir}", quote(dialect, field))
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = query.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    (sql, params)
}

/// Render a `SELECT COUNT(*)` statement for the query's where clause.
#[must_use]
pub fn count_sql(query: &Query, dialect: Dialect) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote(dialect, &query.table));
    if let Some(predicate) = &query.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&render_predicate(predicate, dialect, &mut params));
    }
    (sql, params)
}

fn push_param(params: &mut Vec<Value>, dialect: Dialect, value: Value) -> String {
    params.push(value);
    dialect.placeholder(params.len())
}

fn render_predicate(predicate: &Predicate, dialect: Dialect, params: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::Compare { field, op, value } => {
            render_compare(field, *op, value, dialect, params)
        }
        Predicate::In {
            field,
            values,
            negated,
        } => {
            if values.is_empty() {
                // Empty membership is vacuously false; negated, vacuously true.
                return if *negated { "1 = 1" } else { "1 = 0" }.to_string();
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| push_param(params, dialect, v.clone()))
                .collect();
            let keyword = if *negated { "NOT IN" } else { "IN" };
            format!(
                "{} {keyword} ({})",
                quote(dialect, field),
                placeholders.join(", ")
            )
        }
        Predicate::And(parts) => render_group(parts, " AND ", "1 = 1", dialect, params),
        Predicate::Or(parts) => render_group(parts, " OR ", "1 = 0", dialect, params),
        Predicate::FullText { fields, query } => render_fulltext(fields, query, dialect, params),
        Predicate::Raw { sql, params: bound } => {
            // Raw fragments carry `?` markers; rebind them to dialect placeholders.
            let mut out = String::with_capacity(sql.len());
            let mut bound_iter = bound.iter();
            for ch in sql.chars() {
                if ch == '?' {
                    if let Some(value) = bound_iter.next() {
                        out.push_str(&push_param(params, dialect, value.clone()));
                        continue;
                    }
                }
                out.push(ch);
            }
            out
        }
    }
}

fn render_group(
    parts: &[Predicate],
    joiner: &str,
    empty: &str,
    dialect: Dialect,
    params: &mut Vec<Value>,
) -> String {
    if parts.is_empty() {
        return empty.to_string();
    }
    let rendered: Vec<String> = parts
        .iter()
        .map(|p| format!("({})", render_predicate(p, dialect, params)))
        .collect();
    rendered.join(joiner)
}

fn render_compare(
    field: &str,
    op: CompareOp,
    value: &Value,
    dialect: Dialect,
    params: &mut Vec<Value>,
) -> String {
    let column = quote(dialect, field);
    match op {
        CompareOp::Null => {
            if value.as_bool().unwrap_or(true) {
                format!("{column} IS NULL")
            } else {
                format!("{column} IS NOT NULL")
            }
        }
        CompareOp::Contains | CompareOp::NotContains => {
            let needle = like_pattern(value);
            let placeholder = push_param(params, dialect, Value::Text(needle.to_lowercase()));
            let negate = if op == CompareOp::NotContains { "NOT " } else { "" };
            format!("{negate}LOWER({column}) LIKE {placeholder}")
        }
        CompareOp::ContainsSensitive => {
            let needle = like_pattern(value);
            let placeholder = push_param(params, dialect, Value::Text(needle));
            match dialect {
                Dialect::Mysql => format!("{column} LIKE BINARY {placeholder}"),
                _ => format!("{column} LIKE {placeholder}"),
            }
        }
        _ => {
            let symbol = match op {
                CompareOp::Eq => "=",
                CompareOp::Ne => "<>",
                CompareOp::Lt => "<",
                CompareOp::Lte => "<=",
                CompareOp::Gt => ">",
                CompareOp::Gte => ">=",
                _ => unreachable!("handled above"),
            };
            let placeholder = push_param(params, dialect, value.clone());
            format!("{column} {symbol} {placeholder}")
        }
    }
}

fn like_pattern(value: &Value) -> String {
    let text = match value {
        Value::Text(s) => s.clone(),
        other => other.to_json().to_string(),
    };
    format!("%{text}%")
}

fn render_fulltext(
    fields: &[String],
    query: &str,
    dialect: Dialect,
    params: &mut Vec<Value>,
) -> String {
    if fields.is_empty() {
        return "1 = 0".to_string();
    }
    match dialect {
        Dialect::Postgres => {
            let vector = fields
                .iter()
                .map(|f| format!("coalesce({}, '')", quote_ident(f)))
                .collect::<Vec<_>>()
                .join(" || ' ' || ");
            let placeholder = push_param(params, dialect, Value::Text(query.to_string()));
            format!("to_tsvector('simple', {vector}) @@ plainto_tsquery({placeholder})")
        }
        Dialect::Mysql => {
            let columns = fields
                .iter()
                .map(|f| quote_ident_mysql(f))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholder = push_param(params, dialect, Value::Text(format!("*{query}*")));
            format!("MATCH ({columns}) AGAINST ({placeholder} IN BOOLEAN MODE)")
        }
        Dialect::Sqlite => {
            let clauses: Vec<String> = fields
                .iter()
                .map(|f| {
                    let placeholder = push_param(
                        params,
                        dialect,
                        Value::Text(format!("%{}%", query.to_lowercase())),
                    );
                    format!("LOWER({}) LIKE {placeholder}", quote_ident(f))
                })
                .collect();
            clauses.join(" OR ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentmodel_core::Predicate;

    #[test]
    fn test_select_with_compare() {
        let query = Query::new("articles")
            .filter(Predicate::eq("title", "A"))
            .limit(2)
            .offset(4);
        let (sql, params) = to_sql(&query, Dialect::Postgres);
        assert_eq!(
            sql,
            "SELECT * FROM \"articles\" WHERE \"title\" = $1 LIMIT 2 OFFSET 4"
        );
        assert_eq!(params, vec![Value::Text("A".into())]);
    }

    #[test]
    fn test_sqlite_placeholders_are_numbered() {
        let query = Query::new("articles")
            .filter(Predicate::eq("a", 1))
            .filter(Predicate::eq("b", 2));
        let (sql, params) = to_sql(&query, Dialect::Sqlite);
        assert!(sql.contains("?1"));
        assert!(sql.contains("?2"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_mysql_placeholders_are_bare() {
        let query = Query::new("articles").filter(Predicate::eq("a", 1));
        let (sql, _) = to_sql(&query, Dialect::Mysql);
        assert!(sql.contains("`a` = ?"));
        assert!(!sql.contains("$1"));
    }

    #[test]
    fn test_order_by_and_count() {
        let query = Query::new("articles")
            .filter(Predicate::eq("draft", false))
            .sort("title", SortOrder::Desc);
        let (sql, _) = to_sql(&query, Dialect::Postgres);
        assert!(sql.ends_with("ORDER BY \"title\" DESC"));

        let (count, params) = count_sql(&query, Dialect::Postgres);
        assert_eq!(
            count,
            "SELECT COUNT(*) FROM \"articles\" WHERE \"draft\" = $1"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_in_and_empty_in() {
        let query = Query::new("t").filter(Predicate::in_values(
            "id",
            vec![Value::BigInt(1), Value::BigInt(2)],
        ));
        let (sql, _) = to_sql(&query, Dialect::Postgres);
        assert!(sql.contains("\"id\" IN ($1, $2)"));

        let empty = Query::new("t").filter(Predicate::in_values("id", vec![]));
        let (sql, params) = to_sql(&empty, Dialect::Postgres);
        assert!(sql.contains("1 = 0"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_null_and_contains() {
        let query = Query::new("t")
            .filter(Predicate::compare("deleted", CompareOp::Null, true))
            .filter(Predicate::compare("title", CompareOp::Contains, "Rust"));
        let (sql, params) = to_sql(&query, Dialect::Postgres);
        assert!(sql.contains("\"deleted\" IS NULL"));
        assert!(sql.contains("LOWER(\"title\") LIKE $1"));
        assert_eq!(params, vec![Value::Text("%rust%".into())]);
    }

    #[test]
    fn test_fulltext_postgres() {
        let query = Query::new("articles").filter(Predicate::FullText {
            fields: vec!["title".into(), "body".into()],
            query: "hello".into(),
        });
        let (sql, params) = to_sql(&query, Dialect::Postgres);
        assert!(sql.contains("to_tsvector('simple'"));
        assert!(sql.contains("plainto_tsquery($1)"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_fulltext_mysql() {
        let query = Query::new("articles").filter(Predicate::FullText {
            fields: vec!["title".into(), "body".into()],
            query: "hello".into(),
        });
        let (sql, params) = to_sql(&query, Dialect::Mysql);
        assert!(sql.contains("MATCH (`title`, `body`) AGAINST (? IN BOOLEAN MODE)"));
        assert_eq!(params, vec![Value::Text("*hello*".into())]);
    }

    #[test]
    fn test_fulltext_sqlite_falls_back_to_like() {
        let query = Query::new("articles").filter(Predicate::FullText {
            fields: vec!["title".into(), "body".into()],
            query: "Hello".into(),
        });
        let (sql, params) = to_sql(&query, Dialect::Sqlite);
        assert!(sql.contains("LOWER(\"title\") LIKE ?1"));
        assert!(sql.contains("LOWER(\"body\") LIKE ?2"));
        assert_eq!(params[0], Value::Text("%hello%".into()));
    }

    #[test]
    fn test_raw_rebinds_markers() {
        let query = Query::new("t").filter(Predicate::Raw {
            sql: "\"score\" % ? = ?".into(),
            params: vec![Value::BigInt(3), Value::BigInt(1)],
        });
        let (sql, params) = to_sql(&query, Dialect::Postgres);
        assert!(sql.contains("\"score\" % $1 = $2"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_ident_mysql("a`b"), "`a``b`");
    }
}
