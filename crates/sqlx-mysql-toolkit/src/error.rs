/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for MySQL toolkit operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations (syntax, constraint, connectivity).
   ///
   /// Passed through unchanged so callers see the server's message.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] sqlx_mysql_conn_mgr::Error),

   /// The API was called in a way that cannot produce a safe statement.
   #[error("usage error: {0}")]
   Usage(String),

   /// The table's schema does not support the requested operation.
   #[error("configuration error: {0}")]
   Configuration(String),

   /// A filter named a column the table does not have.
   #[error("unknown column '{column}' in table '{table}'")]
   UnknownColumn { table: String, column: String },

   /// MySQL type that cannot be mapped to a [`Value`](crate::Value).
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Execution failure reported by a pool that is not backed by sqlx.
   #[error("{0}")]
   Other(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("MYSQL_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::ConnectionManager(sqlx_mysql_conn_mgr::Error::DatabaseClosed) => {
            "DATABASE_CLOSED".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::Usage(_) => "USAGE_ERROR".to_string(),
         Error::Configuration(_) => "CONFIGURATION_ERROR".to_string(),
         Error::UnknownColumn { .. } => "UNKNOWN_COLUMN".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::Other(_) => "ERROR".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_usage() {
      let err = Error::Usage("empty list".into());
      assert_eq!(err.error_code(), "USAGE_ERROR");
      assert_eq!(err.to_string(), "usage error: empty list");
   }

   #[test]
   fn test_error_code_configuration() {
      let err = Error::Configuration("table 'logs' has no primary key".into());
      assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
      assert!(err.to_string().contains("logs"));
   }

   #[test]
   fn test_error_code_unknown_column() {
      let err = Error::UnknownColumn {
         table: "users".into(),
         column: "nope".into(),
      };
      assert_eq!(err.error_code(), "UNKNOWN_COLUMN");
      assert!(err.to_string().contains("users"));
      assert!(err.to_string().contains("nope"));
   }

   #[test]
   fn test_error_code_database_closed() {
      let err = Error::from(sqlx_mysql_conn_mgr::Error::DatabaseClosed);
      assert_eq!(err.error_code(), "DATABASE_CLOSED");
   }

   #[test]
   fn test_error_code_unsupported_datatype() {
      let err = Error::UnsupportedDatatype("VECTOR".into());
      assert_eq!(err.error_code(), "UNSUPPORTED_DATATYPE");
   }

   #[test]
   fn test_error_code_sqlx_non_database() {
      // RowNotFound is not a database error, so no MySQL code
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
   }

   #[test]
   fn test_error_code_other() {
      let err = Error::Other("connection reset".into());
      assert_eq!(err.error_code(), "ERROR");
      assert_eq!(err.to_string(), "connection reset");
   }
}
