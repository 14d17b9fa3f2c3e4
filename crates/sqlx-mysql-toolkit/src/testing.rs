//! Scripted in-memory pool for tests.
//!
//! [`MockPool`] records every statement it is asked to run and answers from
//! rules registered by the test. It also counts leases so tests can check
//! that every acquired connection was released.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::connection::{Connection, ConnectionPool, Field, QueryResult};
use crate::{Error, Record, Result, Value};

/// A statement seen by a [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
   pub sql: String,
   pub params: Vec<Value>,
   /// `true` for statements sent over the plain text protocol (`query`)
   pub raw: bool,
}

#[derive(Debug, Clone)]
enum Outcome {
   Respond(QueryResult),
   Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
   rules: Vec<(String, Outcome)>,
   executed: Vec<Executed>,
   acquire_error: Option<String>,
   acquired: usize,
   leased: usize,
   discarded: usize,
   closed: bool,
}

impl MockState {
   /// Most recently registered rule whose pattern occurs in `sql`
   fn outcome_for(&self, sql: &str) -> Option<Outcome> {
      self
         .rules
         .iter()
         .rev()
         .find(|(pattern, _)| sql.contains(pattern.as_str()))
         .map(|(_, outcome)| outcome.clone())
   }
}

/// In-memory [`ConnectionPool`] answering from registered rules.
///
/// Statements that match no rule succeed with an empty result.
#[derive(Debug, Clone, Default)]
pub struct MockPool {
   state: Arc<Mutex<MockState>>,
}

impl MockPool {
   pub fn new() -> Self {
      Self::default()
   }

   /// Answer statements containing `pattern` with `result`
   pub fn respond(&self, pattern: &str, result: QueryResult) {
      self
         .state
         .lock()
         .rules
         .push((pattern.to_string(), Outcome::Respond(result)));
   }

   /// Answer statements containing `pattern` with `rows`.
   ///
   /// Fields are taken from the first row's keys.
   pub fn respond_rows(&self, pattern: &str, rows: Vec<Record>) {
      let fields = rows
         .first()
         .map(|row| {
            row.keys()
               .map(|name| Field {
                  name: name.clone(),
                  type_name: "VARCHAR".to_string(),
               })
               .collect()
         })
         .unwrap_or_default();

      self.respond(
         pattern,
         QueryResult {
            rows,
            fields,
            ..Default::default()
         },
      );
   }

   /// Fail statements containing `pattern` with `message`
   pub fn fail_on(&self, pattern: &str, message: &str) {
      self
         .state
         .lock()
         .rules
         .push((pattern.to_string(), Outcome::Fail(message.to_string())));
   }

   /// Make every following `acquire` fail with `message`
   pub fn fail_acquire(&self, message: &str) {
      self.state.lock().acquire_error = Some(message.to_string());
   }

   /// Answer `DESCRIBE` for `table` with the given `(field, type, key)` columns.
   ///
   /// Columns are reported nullable unless they are part of the primary key.
   pub fn describe(&self, table: &str, columns: &[(&str, &str, &str)]) {
      let rows = columns
         .iter()
         .map(|(field, sql_type, key)| {
            crate::record! {
               "Field" => *field,
               "Type" => *sql_type,
               "Null" => if *key == "PRI" { "NO" } else { "YES" },
               "Key" => *key,
               "Default" => Value::Null,
               "Extra" => "",
            }
         })
         .collect();

      self.respond_rows(&format!("DESCRIBE {}", crate::schema::quote_identifier(table)), rows);
   }

   /// Every statement seen so far, in order
   pub fn statements(&self) -> Vec<Executed> {
      self.state.lock().executed.clone()
   }

   /// Statements sent through `execute` (prepared), in order
   pub fn executed(&self) -> Vec<Executed> {
      self
         .state
         .lock()
         .executed
         .iter()
         .filter(|e| !e.raw)
         .cloned()
         .collect()
   }

   /// SQL text of every statement seen so far, in order
   pub fn sql_log(&self) -> Vec<String> {
      self
         .state
         .lock()
         .executed
         .iter()
         .map(|e| e.sql.clone())
         .collect()
   }

   /// Connections currently leased and not yet released
   pub fn leased(&self) -> usize {
      self.state.lock().leased
   }

   /// Total successful acquires
   pub fn acquired(&self) -> usize {
      self.state.lock().acquired
   }

   /// Connections closed instead of being returned to the pool
   pub fn discarded(&self) -> usize {
      self.state.lock().discarded
   }

   pub fn is_closed(&self) -> bool {
      self.state.lock().closed
   }
}

impl ConnectionPool for MockPool {
   type Connection = MockConnection;

   async fn acquire(&self) -> Result<MockConnection> {
      let mut state = self.state.lock();
      if state.closed {
         return Err(sqlx_mysql_conn_mgr::Error::DatabaseClosed.into());
      }
      if let Some(message) = &state.acquire_error {
         return Err(Error::Other(message.clone()));
      }

      state.acquired += 1;
      state.leased += 1;

      Ok(MockConnection {
         state: Arc::clone(&self.state),
         discard: false,
      })
   }

   async fn close(&self) {
      self.state.lock().closed = true;
   }
}

/// A lease on a [`MockPool`]; dropping it releases the lease.
#[derive(Debug)]
pub struct MockConnection {
   state: Arc<Mutex<MockState>>,
   discard: bool,
}

impl MockConnection {
   fn record(&self, sql: &str, params: Vec<Value>, raw: bool) -> Option<Outcome> {
      let mut state = self.state.lock();
      state.executed.push(Executed {
         sql: sql.to_string(),
         params,
         raw,
      });
      state.outcome_for(sql)
   }
}

impl Connection for MockConnection {
   async fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<QueryResult> {
      match self.record(sql, params, false) {
         Some(Outcome::Respond(result)) => Ok(result),
         Some(Outcome::Fail(message)) => Err(Error::Other(message)),
         None => Ok(QueryResult::default()),
      }
   }

   async fn query(&mut self, sql: &str) -> Result<()> {
      match self.record(sql, Vec::new(), true) {
         Some(Outcome::Fail(message)) => Err(Error::Other(message)),
         _ => Ok(()),
      }
   }

   fn discard(&mut self) {
      self.discard = true;
   }
}

impl Drop for MockConnection {
   fn drop(&mut self) {
      let mut state = self.state.lock();
      state.leased -= 1;
      if self.discard {
         state.discarded += 1;
      }
   }
}
