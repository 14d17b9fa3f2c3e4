//! Schema-driven helpers for a single table.
//!
//! Statements are assembled from the cached column list, so only known
//! columns are ever named in the SQL and every value travels as a bound
//! parameter.

use std::borrow::Borrow;
use std::sync::Arc;

use serde::Serialize;

use crate::connection::{ConnectionPool, QueryResult};
use crate::query::{CompiledQuery, placeholders};
use crate::schema::{SchemaCache, TableSchema, quote_column, quote_identifier};
use crate::{Error, Record, Result, Value, executor};

/// Options for [`Table::insert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
   /// Emit `REPLACE` instead of `INSERT`
   pub replace: bool,
   /// Emit `INSERT IGNORE`
   pub ignore: bool,
}

impl InsertOptions {
   pub fn replace() -> Self {
      Self {
         replace: true,
         ignore: false,
      }
   }

   pub fn ignore() -> Self {
      Self {
         replace: false,
         ignore: true,
      }
   }
}

/// A data correction made by [`Table::sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
   /// Index of the record in the input
   pub row: usize,
   pub field: String,
   pub message: String,
}

/// Accessor for one table, bound to the pool it was loaded from.
pub struct Table<P: ConnectionPool> {
   pool: Arc<P>,
   schema: Arc<TableSchema>,
}

impl<P: ConnectionPool> Clone for Table<P> {
   fn clone(&self) -> Self {
      Self {
         pool: Arc::clone(&self.pool),
         schema: Arc::clone(&self.schema),
      }
   }
}

impl<P: ConnectionPool> Table<P> {
   /// Load the accessor for `name`, introspecting the table on first use.
   pub async fn load(pool: Arc<P>, cache: &SchemaCache, name: &str) -> Result<Self> {
      let schema = cache.get_or_describe(pool.as_ref(), name).await?;
      Ok(Self { pool, schema })
   }

   pub fn name(&self) -> &str {
      self.schema.name()
   }

   pub fn schema(&self) -> &TableSchema {
      &self.schema
   }

   /// Insert one or more records in a single statement.
   ///
   /// Accepts anything iterable over records: a `Vec`, a slice, an array,
   /// `Some(&record)` or `None`. Each record contributes one value per table
   /// column, `NULL` where the record has no such key; keys that are not
   /// columns are ignored. Returns `Ok(None)` without touching the database
   /// when there is nothing to insert.
   pub async fn insert<I>(&self, rows: I, options: InsertOptions) -> Result<Option<QueryResult>>
   where
      I: IntoIterator,
      I::Item: Borrow<Record>,
   {
      let rows: Vec<I::Item> = rows.into_iter().collect();
      let rows: Vec<&Record> = rows.iter().map(|row| Borrow::<Record>::borrow(row)).collect();

      match build_insert(&self.schema, &rows, options)? {
         Some(compiled) => {
            let result = executor::run(self.pool.as_ref(), &compiled.sql, compiled.params).await?;
            Ok(Some(result))
         }
         None => Ok(None),
      }
   }

   /// Update rows matching `filter` with the columns present in `record`.
   ///
   /// Without a filter, the primary key values are taken from `record` and the
   /// primary key columns are left out of `SET`.
   pub async fn update(&self, record: &Record, filter: Option<&Record>) -> Result<QueryResult> {
      let compiled = build_update(&self.schema, record, filter)?;
      executor::run(self.pool.as_ref(), &compiled.sql, compiled.params).await
   }

   /// Fix records in place so they can be written, reporting each change.
   ///
   /// Undefined fields become `NULL`; text longer than a `varchar(n)` or
   /// `char(n)` column allows is truncated to `n` characters. Nothing is
   /// executed.
   pub fn sanitize(&self, rows: &mut [Record]) -> Vec<Warning> {
      sanitize(&self.schema, rows)
   }
}

pub(crate) fn build_insert(
   schema: &TableSchema,
   rows: &[&Record],
   options: InsertOptions,
) -> Result<Option<CompiledQuery>> {
   if rows.is_empty() {
      return Ok(None);
   }
   if options.replace && options.ignore {
      return Err(Error::Usage(
         "REPLACE does not take an IGNORE modifier".to_string(),
      ));
   }

   let columns = schema.columns();
   let verb = match (options.replace, options.ignore) {
      (true, _) => "REPLACE",
      (false, true) => "INSERT IGNORE",
      (false, false) => "INSERT",
   };
   let column_list = columns
      .iter()
      .map(|c| quote_column(&c.name))
      .collect::<Vec<_>>()
      .join(",");
   let row_placeholders = format!("({})", placeholders(columns.len()));

   let mut params = Vec::with_capacity(rows.len() * columns.len());
   for row in rows {
      for column in columns {
         params.push(row.get(&column.name).cloned().unwrap_or(Value::Null));
      }
   }

   let sql = format!(
      "{} INTO {} ({}) VALUES {}",
      verb,
      quote_identifier(schema.name()),
      column_list,
      vec![row_placeholders.as_str(); rows.len()].join(",")
   );

   Ok(Some(CompiledQuery { sql, params }))
}

pub(crate) fn build_update(
   schema: &TableSchema,
   record: &Record,
   filter: Option<&Record>,
) -> Result<CompiledQuery> {
   let derived;
   let (filter, skip_primary_key) = match filter {
      Some(filter) => {
         if filter.is_empty() {
            return Err(Error::Usage(format!(
               "update filter for table '{}' is empty",
               schema.name()
            )));
         }
         if let Some(column) = filter.keys().find(|k| !schema.has_column(k)) {
            return Err(Error::UnknownColumn {
               table: schema.name().to_string(),
               column: column.clone(),
            });
         }
         (filter, false)
      }
      None => {
         derived = primary_key_filter(schema, record)?;
         (&derived, true)
      }
   };

   let mut changes = Vec::new();
   let mut params = Vec::new();
   for column in schema.columns() {
      if skip_primary_key && column.is_primary_key {
         continue;
      }
      if let Some(value) = record.get(&column.name) {
         changes.push(format!("{} = ?", quote_column(&column.name)));
         params.push(value.clone());
      }
   }

   if changes.is_empty() {
      return Err(Error::Usage(format!(
         "record has no columns to update in table '{}'",
         schema.name()
      )));
   }

   let mut conditions = Vec::with_capacity(filter.len());
   for (field, value) in filter {
      if value.is_null() {
         conditions.push(format!("{} IS NULL", quote_column(field)));
      } else {
         conditions.push(format!("{} = ?", quote_column(field)));
         params.push(value.clone());
      }
   }

   let sql = format!(
      "UPDATE {} SET {} WHERE {}",
      quote_identifier(schema.name()),
      changes.join(", "),
      conditions.join(" AND ")
   );

   Ok(CompiledQuery { sql, params })
}

fn primary_key_filter(schema: &TableSchema, record: &Record) -> Result<Record> {
   let mut filter = Record::new();
   for column in schema.primary_key() {
      match record.get(&column.name) {
         Some(value) if !value.is_null() && !value.is_undefined() => {
            filter.insert(column.name.clone(), value.clone());
         }
         _ => {
            return Err(Error::Usage(format!(
               "record has no value for primary key column '{}' of table '{}'",
               column.name,
               schema.name()
            )));
         }
      }
   }

   if filter.is_empty() {
      return Err(Error::Configuration(format!(
         "table '{}' has no primary key; pass an explicit filter to update",
         schema.name()
      )));
   }

   Ok(filter)
}

pub(crate) fn sanitize(schema: &TableSchema, rows: &mut [Record]) -> Vec<Warning> {
   let mut warnings = Vec::new();

   for (i, row) in rows.iter_mut().enumerate() {
      for column in schema.columns() {
         let Some(value) = row.get_mut(&column.name) else {
            continue;
         };

         if value.is_undefined() {
            warnings.push(Warning {
               row: i,
               field: column.name.clone(),
               message: "was undefined".to_string(),
            });
            *value = Value::Null;
         }

         if let (Some(max), Value::Text(text)) = (column.max_length(), &mut *value) {
            let length = text.chars().count();
            if length > max {
               warnings.push(Warning {
                  row: i,
                  field: column.name.clone(),
                  message: format!("exceeded length ({length} > {max})"),
               });
               *text = text.chars().take(max).collect();
            }
         }
      }
   }

   warnings
}
