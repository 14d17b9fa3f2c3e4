//! Closure-scoped transactions on a single leased connection

use futures::future::BoxFuture;
use sqlx_mysql_toolkit::{Connection, ConnectionPool, Error, Result};
use tracing::{debug, warn};

/// Run `f` inside `START TRANSACTION` / `COMMIT` on one connection.
///
/// `f` receives the raw connection; every statement it issues goes through
/// that connection and therefore belongs to the transaction. If `f` fails,
/// or `COMMIT` fails, the transaction is rolled back and the original error
/// is returned. A rollback failure is only logged.
///
/// The connection is released on every path before this returns. If the
/// transaction cannot be closed (the returned future is dropped, `f`
/// panics, or `ROLLBACK` fails) the connection is discarded rather than
/// returned to the pool.
pub async fn run_transaction<P, F, T>(pool: &P, f: F) -> Result<T>
where
   P: ConnectionPool,
   F: for<'c> FnOnce(&'c mut P::Connection) -> BoxFuture<'c, Result<T>>,
   T: Send,
{
   let mut tx = OpenTransaction {
      conn: pool.acquire().await?,
      open: true,
   };

   if let Err(e) = tx.conn.query("START TRANSACTION").await {
      tx.open = false;
      return Err(e);
   }
   debug!("Transaction started");

   let result = match f(&mut tx.conn).await {
      Ok(value) => tx.conn.query("COMMIT").await.map(|()| value),
      Err(e) => Err(e),
   };

   match &result {
      Ok(_) => {
         tx.open = false;
         debug!("Transaction committed");
      }
      Err(e) => tx.open = !rollback(&mut tx.conn, e).await,
   }

   result
}

/// A leased connection with a transaction that may still be open.
///
/// Dropped while `open`, the connection is discarded so no later borrower
/// inherits the transaction.
struct OpenTransaction<C: Connection> {
   conn: C,
   open: bool,
}

impl<C: Connection> Drop for OpenTransaction<C> {
   fn drop(&mut self) {
      if self.open {
         warn!("Discarding connection left inside an open transaction");
         self.conn.discard();
      }
   }
}

/// Returns whether `ROLLBACK` succeeded
async fn rollback<C: Connection>(conn: &mut C, cause: &Error) -> bool {
   match conn.query("ROLLBACK").await {
      Ok(()) => {
         debug!("Transaction rolled back after error: {}", cause);
         true
      }
      Err(rollback_err) => {
         warn!(
            "Rollback failed ({}) after transaction error: {}",
            rollback_err, cause
         );
         false
      }
   }
}
