//! The in-memory storage backend.
//!
//! Tables are vectors of rows behind one mutex. Inserts assign monotonically
//! increasing identifiers into the conventional `id` column when the row does
//! not carry one. Transaction scopes snapshot the whole table map on begin;
//! rollback restores the snapshot, commit discards it. Writes through an open
//! scope land directly in shared state, so the backend is a single-writer
//! store: suitable for tests and embedding, not for concurrent writers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use asupersync::{Cx, Outcome};
use contentmodel_core::{
    Backend, Dialect, Error, Predicate, Query, Row, StoreOps, TransactionOps, Value, try_outcome,
};

use crate::eval::{apply_window, matches, sort_rows};

/// The column inserts assign generated identifiers to.
pub const ID_COLUMN: &str = "id";

#[derive(Debug, Clone, Default)]
struct Table {
    next_id: i64,
    rows: Vec<Row>,
}

type Tables = HashMap<String, Table>;

/// An in-memory [`Backend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    dialect: Dialect,
}

impl MemoryBackend {
    /// Create an empty backend reporting the SQLite dialect.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            dialect: Dialect::Sqlite,
        }
    }

    /// Report a different dialect, for exercising dialect-dependent callers.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        self.tables
            .lock()
            .map_err(|_| Error::backend("memory backend state lock poisoned"))
    }

    fn run_select(&self, query: &Query) -> Result<Vec<Row>, Error> {
        let tables = self.lock()?;
        let mut rows: Vec<Row> = tables
            .get(&query.table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| {
                        query.predicate.as_ref().is_none_or(|p| matches(p, row))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_rows(&mut rows, &query.sort);
        Ok(apply_window(rows, query.offset, query.limit))
    }

    fn run_insert(&self, table: &str, mut row: Row) -> Result<i64, Error> {
        let mut tables = self.lock()?;
        let table = tables.entry(table.to_string()).or_default();
        let id = match row.named(ID_COLUMN).and_then(Value::as_i64) {
            Some(supplied) => {
                table.next_id = table.next_id.max(supplied);
                supplied
            }
            None => {
                table.next_id += 1;
                row.push(ID_COLUMN, Value::BigInt(table.next_id));
                table.next_id
            }
        };
        table.rows.push(row);
        Ok(id)
    }

    fn run_update(&self, table: &str, predicate: &Predicate, values: &Row) -> Result<u64, Error> {
        let mut tables = self.lock()?;
        let Some(table) = tables.get_mut(table) else {
            return Ok(0);
        };
        let mut affected = 0;
        for row in &mut table.rows {
            if matches(predicate, row) {
                for (column, value) in values.iter() {
                    row.set(column, value.clone());
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn run_delete(&self, table: &str, predicate: &Predicate) -> Result<u64, Error> {
        let mut tables = self.lock()?;
        let Some(table) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table.rows.retain(|row| !matches(predicate, row));
        Ok((before - table.rows.len()) as u64)
    }

    fn run_count(&self, query: &Query) -> Result<u64, Error> {
        let tables = self.lock()?;
        let count = tables
            .get(&query.table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| {
                        query.predicate.as_ref().is_none_or(|p| matches(p, row))
                    })
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    fn snapshot(&self) -> Result<Tables, Error> {
        Ok(self.lock()?.clone())
    }

    fn restore(&self, snapshot: Tables) -> Result<(), Error> {
        *self.lock()? = snapshot;
        Ok(())
    }
}

impl StoreOps for MemoryBackend {
    async fn select(&self, _cx: &Cx, query: &Query) -> Outcome<Vec<Row>, Error> {
        match self.run_select(query) {
            Ok(rows) => Outcome::Ok(rows),
            Err(e) => Outcome::Err(e),
        }
    }

    async fn insert(&self, _cx: &Cx, table: &str, row: Row) -> Outcome<i64, Error> {
        match self.run_insert(table, row) {
            Ok(id) => Outcome::Ok(id),
            Err(e) => Outcome::Err(e),
        }
    }

    async fn update(
        &self,
        _cx: &Cx,
        table: &str,
        predicate: &Predicate,
        values: Row,
    ) -> Outcome<u64, Error> {
        match self.run_update(table, predicate, &values) {
            Ok(n) => Outcome::Ok(n),
            Err(e) => Outcome::Err(e),
        }
    }

    async fn delete(&self, _cx: &Cx, table: &str, predicate: &Predicate) -> Outcome<u64, Error> {
        match self.run_delete(table, predicate) {
            Ok(n) => Outcome::Ok(n),
            Err(e) => Outcome::Err(e),
        }
    }

    async fn count(&self, _cx: &Cx, query: &Query) -> Outcome<u64, Error> {
        match self.run_count(query) {
            Ok(n) => Outcome::Ok(n),
            Err(e) => Outcome::Err(e),
        }
    }
}

impl Backend for MemoryBackend {
    type Tx<'conn> = MemoryTransaction<'conn>;

    async fn begin(&self, _cx: &Cx) -> Outcome<MemoryTransaction<'_>, Error> {
        match self.snapshot() {
            Ok(snapshot) => Outcome::Ok(MemoryTransaction {
                backend: self,
                snapshot,
            }),
            Err(e) => Outcome::Err(e),
        }
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// An open scope over a [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryTransaction<'conn> {
    backend: &'conn MemoryBackend,
    snapshot: Tables,
}

impl StoreOps for MemoryTransaction<'_> {
    async fn select(&self, cx: &Cx, query: &Query) -> Outcome<Vec<Row>, Error> {
        self.backend.select(cx, query).await
    }

    async fn insert(&self, cx: &Cx, table: &str, row: Row) -> Outcome<i64, Error> {
        self.backend.insert(cx, table, row).await
    }

    async fn update(
        &self,
        cx: &Cx,
        table: &str,
        predicate: &Predicate,
        values: Row,
    ) -> Outcome<u64, Error> {
        self.backend.update(cx, table, predicate, values).await
    }

    async fn delete(&self, cx: &Cx, table: &str, predicate: &Predicate) -> Outcome<u64, Error> {
        self.backend.delete(cx, table, predicate).await
    }

    async fn count(&self, cx: &Cx, query: &Query) -> Outcome<u64, Error> {
        self.backend.count(cx, query).await
    }
}

impl TransactionOps for MemoryTransaction<'_> {
    async fn commit(self, _cx: &Cx) -> Outcome<(), Error> {
        drop(self.snapshot);
        Outcome::Ok(())
    }

    async fn rollback(self, _cx: &Cx) -> Outcome<(), Error> {
        match self.backend.restore(self.snapshot) {
            Ok(()) => Outcome::Ok(()),
            Err(e) => Outcome::Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asupersync::runtime::RuntimeBuilder;
    use contentmodel_core::SortOrder;

    fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> Result<T, String> {
        match outcome {
            Outcome::Ok(v) => Ok(v),
            Outcome::Err(e) => Err(format!("unexpected error: {e}")),
            Outcome::Cancelled(r) => Err(format!("cancelled: {r:?}")),
            Outcome::Panicked(p) => Err(format!("panicked: {p:?}")),
        }
    }

    fn row(title: &str, views: i64) -> Row {
        Row::new()
            .with("title", Value::from(title))
            .with("views", Value::BigInt(views))
    }

    #[test]
    fn test_insert_assigns_monotonic_ids() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            let a = unwrap_outcome(backend.insert(&cx, "articles", row("a", 1)).await).unwrap();
            let b = unwrap_outcome(backend.insert(&cx, "articles", row("b", 2)).await).unwrap();
            assert_eq!((a, b), (1, 2));

            let rows =
                unwrap_outcome(backend.select(&cx, &Query::new("articles")).await).unwrap();
            assert_eq!(rows[0].get_named::<i64>(ID_COLUMN).unwrap(), 1);
        });
    }

    #[test]
    fn test_update_delete_and_count() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            for (t, v) in [("a", 1), ("b", 2), ("c", 3)] {
                unwrap_outcome(backend.insert(&cx, "articles", row(t, v)).await).unwrap();
            }

            let bumped = unwrap_outcome(
                backend
                    .update(
                        &cx,
                        "articles",
                        &Predicate::compare("views", contentmodel_core::CompareOp::Gte, 2),
                        Row::new().with("views", Value::BigInt(9)),
                    )
                    .await,
            )
            .unwrap();
            assert_eq!(bumped, 2);

            let removed = unwrap_outcome(
                backend
                    .delete(&cx, "articles", &Predicate::eq("title", "a"))
                    .await,
            )
            .unwrap();
            assert_eq!(removed, 1);

            let left = unwrap_outcome(backend.count(&cx, &Query::new("articles")).await).unwrap();
            assert_eq!(left, 2);
        });
    }

    #[test]
    fn test_select_sorts_and_windows() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            for (t, v) in [("a", 3), ("b", 1), ("c", 2)] {
                unwrap_outcome(backend.insert(&cx, "articles", row(t, v)).await).unwrap();
            }
            let query = Query::new("articles")
                .sort("views", SortOrder::Asc)
                .offset(1)
                .limit(1);
            let rows = unwrap_outcome(backend.select(&cx, &query).await).unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].get_named::<String>("title").unwrap(), "c");
        });
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            unwrap_outcome(backend.insert(&cx, "articles", row("kept", 1)).await).unwrap();

            let tx = unwrap_outcome(backend.begin(&cx).await).unwrap();
            unwrap_outcome(tx.insert(&cx, "articles", row("discarded", 2)).await).unwrap();
            unwrap_outcome(
                tx.delete(&cx, "articles", &Predicate::eq("title", "kept"))
                    .await,
            )
            .unwrap();
            unwrap_outcome(tx.rollback(&cx).await).unwrap();

            let rows =
                unwrap_outcome(backend.select(&cx, &Query::new("articles")).await).unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].get_named::<String>("title").unwrap(), "kept");
        });
    }

    #[test]
    fn test_commit_keeps_writes() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        rt.block_on(async {
            let backend = MemoryBackend::new();
            let tx = unwrap_outcome(backend.begin(&cx).await).unwrap();
            unwrap_outcome(tx.insert(&cx, "articles", row("committed", 1)).await).unwrap();
            unwrap_outcome(tx.commit(&cx).await).unwrap();

            let count =
                unwrap_outcome(backend.count(&cx, &Query::new("articles")).await).unwrap();
            assert_eq!(count, 1);
        });
    }
}
