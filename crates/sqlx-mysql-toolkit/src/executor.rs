//! Statement execution against a pool: acquire, execute, release.

use tracing::debug;

use crate::connection::{Connection, ConnectionPool, QueryResult};
use crate::{Error, Query, Record, Result, Value};

/// Execute raw SQL with positional parameters on a freshly leased connection.
///
/// The connection is released before this returns, whether the statement
/// succeeded or not. Execution errors are passed through unchanged.
pub async fn run<P: ConnectionPool>(pool: &P, sql: &str, params: Vec<Value>) -> Result<QueryResult> {
   ensure_bindable(&params)?;

   debug!("Executing: {}", log_slice(sql));

   let mut conn = pool.acquire().await?;
   let result = conn.execute(sql, params).await;
   drop(conn);

   result
}

/// Compile `query` and execute it.
pub async fn query<P: ConnectionPool>(pool: &P, query: &Query) -> Result<QueryResult> {
   let compiled = query.compile()?;
   run(pool, &compiled.sql, compiled.params).await
}

/// Execute `query` and return its first row, if any.
pub async fn get<P: ConnectionPool>(pool: &P, query: &Query) -> Result<Option<Record>> {
   let result = self::query(pool, query).await?;
   Ok(result.rows.into_iter().next())
}

/// Reject parameters that have no value to bind.
pub(crate) fn ensure_bindable(params: &[Value]) -> Result<()> {
   match params.iter().position(Value::is_undefined) {
      Some(index) => Err(Error::Usage(format!(
         "parameter {} is undefined; sanitize the record or bind Value::Null",
         index + 1
      ))),
      None => Ok(()),
   }
}

/// A short single-line rendition of `sql` for log output.
///
/// Statements longer than 103 characters are cut to their first 100 followed
/// by `...`; whitespace runs collapse to one space.
pub fn log_slice(sql: &str) -> String {
   let slice = if sql.chars().count() > 103 {
      let head: String = sql.chars().take(100).collect();
      format!("{head}...")
   } else {
      sql.to_string()
   };

   slice.split_whitespace().collect::<Vec<_>>().join(" ")
}
