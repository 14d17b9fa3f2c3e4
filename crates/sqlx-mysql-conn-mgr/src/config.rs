//! Configuration for MySQL connection pools

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for MySqlDatabase connection pools
///
/// # Examples
///
/// ```
/// use sqlx_mysql_conn_mgr::MySqlDatabaseConfig;
/// use std::time::Duration;
///
/// // Use defaults
/// let config = MySqlDatabaseConfig::default();
///
/// // Override just one field
/// let config = MySqlDatabaseConfig {
///     connection_limit: 20,
///     ..Default::default()
/// };
///
/// assert_eq!(config.acquire_timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlDatabaseConfig {
   /// Maximum number of connections leased at the same time
   ///
   /// Callers beyond this limit wait in `acquire` until a connection is
   /// released or `acquire_timeout` elapses.
   ///
   /// Default: 500
   pub connection_limit: u32,

   /// Number of idle connections the pool tries to keep open
   ///
   /// Default: 0
   pub min_connections: u32,

   /// How long `acquire` waits for a free connection before failing
   ///
   /// Default: 30 seconds
   pub acquire_timeout: Duration,

   /// Idle connections older than this are closed by the pool
   ///
   /// Default: 10 minutes
   pub idle_timeout: Duration,
}

impl Default for MySqlDatabaseConfig {
   fn default() -> Self {
      Self {
         connection_limit: 500,
         min_connections: 0,
         acquire_timeout: Duration::from_secs(30),
         idle_timeout: Duration::from_secs(600),
      }
   }
}
