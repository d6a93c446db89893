//! Storage backend traits.
//!
//! The engine never constructs SQL or touches a driver directly: everything it
//! needs from storage is the narrow surface below. `StoreOps` is implemented
//! by both connections and open transaction scopes, so write helpers can be
//! generic over "wherever these writes should land". Transaction scopes are
//! explicit values threaded through the call graph — there is no ambient or
//! thread-local transaction state.

use asupersync::{Cx, Outcome};

use crate::error::Error;
use crate::query::{Dialect, Predicate, Query};
use crate::row::Row;

/// Row-level operations available on a connection or an open transaction.
pub trait StoreOps: Send + Sync {
    /// Execute a query and return matching rows.
    fn select(
        &self,
        cx: &Cx,
        query: &Query,
    ) -> impl std::future::Future<Output = Outcome<Vec<Row>, Error>> + Send;

    /// Insert a row, returning the backend-assigned primary identifier.
    fn insert(
        &self,
        cx: &Cx,
        table: &str,
        row: Row,
    ) -> impl std::future::Future<Output = Outcome<i64, Error>> + Send;

    /// Update matching rows with the given column values; returns rows affected.
    fn update(
        &self,
        cx: &Cx,
        table: &str,
        predicate: &Predicate,
        values: Row,
    ) -> impl std::future::Future<Output = Outcome<u64, Error>> + Send;

    /// Delete matching rows; returns rows affected.
    fn delete(
        &self,
        cx: &Cx,
        table: &str,
        predicate: &Predicate,
    ) -> impl std::future::Future<Output = Outcome<u64, Error>> + Send;

    /// Count rows matching a query (sort/offset/limit are ignored).
    fn count(
        &self,
        cx: &Cx,
        query: &Query,
    ) -> impl std::future::Future<Output = Outcome<u64, Error>> + Send;
}

/// A storage backend: row operations plus transaction scopes.
pub trait Backend: StoreOps {
    /// The transaction scope type for this backend.
    type Tx<'conn>: TransactionOps
    where
        Self: 'conn;

    /// Open a transaction scope. Writes through the scope become visible to
    /// other readers on commit and are discarded on rollback.
    fn begin(
        &self,
        cx: &Cx,
    ) -> impl std::future::Future<Output = Outcome<Self::Tx<'_>, Error>> + Send;

    /// The SQL dialect this backend speaks, for query rendering and
    /// nested-transaction policy.
    fn dialect(&self) -> Dialect;
}

/// An open transaction scope.
pub trait TransactionOps: StoreOps {
    /// Commit all writes made through this scope.
    fn commit(self, cx: &Cx) -> impl std::future::Future<Output = Outcome<(), Error>> + Send;

    /// Discard all writes made through this scope.
    fn rollback(self, cx: &Cx) -> impl std::future::Future<Output = Outcome<(), Error>> + Send;
}
