//! # sqlx-mysql-conn-mgr
//!
//! A minimal wrapper around SQLx that owns the lifecycle of one MySQL
//! connection pool.
//!
//! ## Core Types
//!
//! - **[`MySqlDatabase`]**: The pool, with an explicit `close()` after which every
//!   acquire fails
//! - **[`MySqlDatabaseConfig`]**: Connection limit and timeouts
//! - **[`Error`]**: Error type for pool operations
//!
//! Leased connections go back to the pool when they are dropped, so a lease
//! held in a local binding is released on every exit path, including `?`.

mod config;
mod database;
mod error;

// Re-export public types
pub use config::MySqlDatabaseConfig;
pub use database::MySqlDatabase;
pub use error::{Error, Result};

pub use sqlx::mysql::MySqlConnectOptions;
