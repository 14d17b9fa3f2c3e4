//! [`ConnectionPool`] and [`Connection`] for the sqlx MySQL driver.

use futures::TryStreamExt;
use sqlx::mysql::{MySqlArguments, MySqlConnection};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Either, MySql, Statement};
use sqlx_mysql_conn_mgr::MySqlDatabase;

use crate::connection::{Connection, ConnectionPool, QueryResult};
use crate::{Result, Value, decode, executor};

impl ConnectionPool for MySqlDatabase {
   type Connection = PoolConnection<MySql>;

   async fn acquire(&self) -> Result<Self::Connection> {
      Ok(MySqlDatabase::acquire(self).await?)
   }

   async fn close(&self) {
      MySqlDatabase::close(self).await
   }
}

impl Connection for PoolConnection<MySql> {
   async fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<QueryResult> {
      executor::ensure_bindable(&params)?;

      let conn: &mut MySqlConnection = &mut **self;

      // Prepared statements are cached per connection, so this is a lookup
      // after the first use. It also yields the column definitions when the
      // result set is empty.
      let statement = sqlx::Executor::prepare(&mut *conn, sql).await?;

      let mut result = QueryResult {
         fields: decode::fields(statement.columns()),
         ..Default::default()
      };

      let mut q = statement.query();
      for value in params {
         q = bind_value(q, value);
      }

      // One prepared statement, so the stream carries this statement's rows
      // followed by its completion summary.
      #[allow(deprecated)]
      let mut steps = q.fetch_many(&mut *conn);

      while let Some(step) = steps.try_next().await? {
         match step {
            Either::Left(done) => {
               result.rows_affected += done.rows_affected();
               result.last_insert_id = done.last_insert_id();
            }
            Either::Right(row) => result.rows.push(decode::to_record(&row)?),
         }
      }

      Ok(result)
   }

   async fn query(&mut self, sql: &str) -> Result<()> {
      let conn: &mut MySqlConnection = &mut **self;
      sqlx::Executor::execute(conn, sqlx::raw_sql(sql)).await?;
      Ok(())
   }

   fn discard(&mut self) {
      self.close_on_drop();
   }
}

/// Helper function to bind a [`Value`] to a SQLx query
pub(crate) fn bind_value<'q>(
   query: Query<'q, MySql, MySqlArguments>,
   value: Value,
) -> Query<'q, MySql, MySqlArguments> {
   match value {
      // Undefined is rejected before execution; bind NULL if one slips through
      Value::Null | Value::Undefined => query.bind(None::<String>),
      Value::Bool(b) => query.bind(b),
      Value::Int(i) => query.bind(i),
      Value::UInt(u) => query.bind(u),
      Value::Float(f) => query.bind(f),
      Value::Text(s) => query.bind(s),
      Value::Bytes(b) => query.bind(b),
      Value::Date(d) => query.bind(d),
      Value::Time(t) => query.bind(t),
      Value::DateTime(dt) => query.bind(dt),
   }
}
