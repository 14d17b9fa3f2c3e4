//! The pool capabilities the toolkit consumes.
//!
//! [`MySqlDatabase`](sqlx_mysql_conn_mgr::MySqlDatabase) implements these for
//! a real server; any other pool (or a scripted test double) can be plugged
//! in by implementing them too.

use std::future::Future;

use serde::Serialize;

use crate::{Record, Result, Value};

/// Column metadata of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
   pub name: String,
   pub type_name: String,
}

/// Result of executing one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
   /// Rows produced by the statement, empty for writes.
   pub rows: Vec<Record>,
   /// Columns of the result set, reported even when no row matched.
   ///
   /// Empty for statements that produce no result set.
   pub fields: Vec<Field>,
   /// The number of rows affected by a write.
   pub rows_affected: u64,
   /// The AUTO_INCREMENT value generated by the last INSERT, or 0.
   pub last_insert_id: u64,
}

/// An exclusive lease on one database session.
///
/// Dropping the value releases the lease back to its pool; hold it in a local
/// binding and every exit path, `?` included, releases it.
pub trait Connection: Send {
   /// Execute one statement with positional `?` parameters.
   fn execute(
      &mut self,
      sql: &str,
      params: Vec<Value>,
   ) -> impl Future<Output = Result<QueryResult>> + Send;

   /// Run a statement over the plain text protocol, discarding any output.
   ///
   /// Used for `START TRANSACTION`, `COMMIT` and `ROLLBACK`.
   fn query(&mut self, sql: &str) -> impl Future<Output = Result<()>> + Send;

   /// Close the session instead of returning it to the pool once dropped.
   ///
   /// For sessions left in an unknown state, such as an open transaction.
   fn discard(&mut self);
}

/// A bounded set of reusable connections.
pub trait ConnectionPool: Send + Sync + 'static {
   type Connection: Connection;

   /// Lease a connection, waiting if the pool is at its limit.
   fn acquire(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

   /// Close the pool; later acquires fail.
   fn close(&self) -> impl Future<Output = ()> + Send;
}
