//! # sqlx-mysql-toolkit
//!
//! A thin convenience layer over a MySQL connection pool.
//!
//! ## Core Types
//!
//! - **[`Query`]** and the [`sql!`] macro: SQL fragments interleaved with bound
//!   values, compiled to `?` placeholders with list expansion
//! - **[`ConnectionPool`]** / **[`Connection`]**: the pool capabilities the
//!   toolkit consumes, implemented for [`MySqlDatabase`](sqlx_mysql_conn_mgr::MySqlDatabase)
//! - **[`executor`]**: acquire, execute, release
//! - **[`Table`]**: `insert`, `update` and `sanitize` driven by the table's
//!   introspected columns, cached in a [`SchemaCache`]
//! - **[`Value`]** / **[`Record`]**: typed scalars and ordered rows
//! - **[`Error`]**: Error type for toolkit operations

mod connection;
mod decode;
mod error;
pub mod executor;
mod mysql;
mod query;
mod schema;
mod table;
mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use connection::{Connection, ConnectionPool, Field, QueryResult};
pub use error::{Error, Result};
pub use query::{CompiledQuery, IntoParam, Param, Query};
pub use schema::{ColumnInfo, SchemaCache, TableSchema, describe};
pub use table::{InsertOptions, Table, Warning};
pub use value::{Record, Value};

pub use sqlx_mysql_conn_mgr::{MySqlConnectOptions, MySqlDatabase, MySqlDatabaseConfig};
