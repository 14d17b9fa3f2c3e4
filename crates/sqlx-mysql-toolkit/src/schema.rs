//! Table schema introspection and the per-database schema cache.
//!
//! A table's columns are read once with `DESCRIBE` and kept for the lifetime
//! of the cache. Nothing invalidates an entry: if the table is altered
//! afterwards, the cached schema is stale until a new cache is created.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::connection::ConnectionPool;
use crate::{Error, Record, Result, executor};

/// One column as reported by `DESCRIBE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
   /// Column name
   pub name: String,
   /// Declared type, e.g. `varchar(255)` or `int unsigned`
   pub sql_type: String,
   pub nullable: bool,
   /// Whether the column is part of the primary key
   pub is_primary_key: bool,
   pub default: Option<String>,
   /// Extra attributes such as `auto_increment`
   pub extra: String,
}

impl ColumnInfo {
   /// Maximum character length for `varchar(n)` and `char(n)` columns
   pub fn max_length(&self) -> Option<usize> {
      let sql_type = self.sql_type.trim().to_ascii_lowercase();
      let args = sql_type
         .strip_prefix("varchar(")
         .or_else(|| sql_type.strip_prefix("char("))?;
      let (length, _) = args.split_once(')')?;
      length.trim().parse().ok()
   }
}

/// The introspected columns of one table, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
   name: String,
   columns: Vec<ColumnInfo>,
}

impl TableSchema {
   pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
      Self {
         name: name.into(),
         columns,
      }
   }

   /// Build a schema from `DESCRIBE` output rows
   /// (`Field`, `Type`, `Null`, `Key`, `Default`, `Extra`).
   pub fn from_describe(name: &str, rows: &[Record]) -> Result<Self> {
      if rows.is_empty() {
         return Err(Error::Configuration(format!(
            "DESCRIBE {name} returned no columns"
         )));
      }

      let text = |row: &Record, key: &str| row.get(key).and_then(|v| v.to_text_lossy());

      let mut columns = Vec::with_capacity(rows.len());
      for row in rows {
         let field = text(row, "Field").ok_or_else(|| {
            Error::Configuration(format!("DESCRIBE {name} returned a row without a Field"))
         })?;

         columns.push(ColumnInfo {
            name: field,
            sql_type: text(row, "Type").unwrap_or_default(),
            nullable: text(row, "Null").is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            is_primary_key: text(row, "Key").is_some_and(|v| v == "PRI"),
            default: text(row, "Default"),
            extra: text(row, "Extra").unwrap_or_default(),
         });
      }

      Ok(Self::new(name, columns))
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn columns(&self) -> &[ColumnInfo] {
      &self.columns
   }

   pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
      self.columns.iter().find(|c| c.name == name)
   }

   pub fn has_column(&self, name: &str) -> bool {
      self.column(name).is_some()
   }

   /// Primary key columns, in declaration order
   pub fn primary_key(&self) -> impl Iterator<Item = &ColumnInfo> {
      self.columns.iter().filter(|c| c.is_primary_key)
   }
}

/// Run `DESCRIBE` for `table` on `pool`.
pub async fn describe<P: ConnectionPool>(pool: &P, table: &str) -> Result<TableSchema> {
   if table.trim().is_empty() {
      return Err(Error::Usage("table name must not be empty".to_string()));
   }

   let sql = format!("DESCRIBE {}", quote_identifier(table));
   let result = executor::run(pool, &sql, Vec::new()).await?;
   TableSchema::from_describe(table, &result.rows)
}

/// Table name to schema, shared by every clone.
///
/// Populated at most once per name. Two concurrent first lookups of the same
/// table may both run `DESCRIBE`; the first result stored is kept.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache(Arc<RwLock<HashMap<String, Arc<TableSchema>>>>);

impl SchemaCache {
   pub fn new() -> Self {
      Self::default()
   }

   /// Cached schema for `table`, if it has been loaded
   pub async fn get(&self, table: &str) -> Option<Arc<TableSchema>> {
      self.0.read().await.get(table).cloned()
   }

   /// Cached schema for `table`, introspecting it on first use
   pub async fn get_or_describe<P: ConnectionPool>(
      &self,
      pool: &P,
      table: &str,
   ) -> Result<Arc<TableSchema>> {
      if let Some(schema) = self.get(table).await {
         return Ok(schema);
      }

      let schema = Arc::new(describe(pool, table).await?);
      debug!(
         "Cached schema for table {} ({} columns)",
         table,
         schema.columns().len()
      );

      let mut schemas = self.0.write().await;
      Ok(Arc::clone(
         schemas.entry(table.to_string()).or_insert(schema),
      ))
   }

   /// Number of cached tables
   pub async fn len(&self) -> usize {
      self.0.read().await.len()
   }

   pub async fn is_empty(&self) -> bool {
      self.0.read().await.is_empty()
   }
}

/// Quote an identifier with backticks, doubling embedded backticks.
///
/// A qualified `database.table` name is quoted per segment.
pub(crate) fn quote_identifier(name: &str) -> String {
   name
      .split('.')
      .map(|part| format!("`{}`", part.replace('`', "``")))
      .collect::<Vec<_>>()
      .join(".")
}

/// Quote a single column name; dots are part of the name.
pub(crate) fn quote_column(name: &str) -> String {
   format!("`{}`", name.replace('`', "``"))
}
