//! Decoding MySQL rows into [`Record`]s.

use sqlx::mysql::{MySqlColumn, MySqlRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use time::{Date, PrimitiveDateTime, Time};

use crate::connection::Field;
use crate::{Error, Record, Result, Value};

/// How a column's wire value is read, chosen from its type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
   Bool,
   Int,
   UInt,
   Float,
   Double,
   Text,
   Bytes,
   Date,
   Time,
   DateTime,
}

fn kind_of(type_name: &str) -> Result<Kind> {
   let kind = match type_name {
      "BOOLEAN" => Kind::Bool,
      name if name.ends_with(" UNSIGNED") || name == "BIT" => Kind::UInt,
      "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => Kind::Int,
      "FLOAT" => Kind::Float,
      "DOUBLE" => Kind::Double,
      // DECIMAL keeps its exact textual form
      "DECIMAL" | "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
      | "SET" | "JSON" => Kind::Text,
      "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
         Kind::Bytes
      }
      "DATE" => Kind::Date,
      "TIME" => Kind::Time,
      "DATETIME" | "TIMESTAMP" => Kind::DateTime,
      other => return Err(Error::UnsupportedDatatype(other.to_string())),
   };

   Ok(kind)
}

/// Column metadata of a result set
pub(crate) fn fields(columns: &[MySqlColumn]) -> Vec<Field> {
   columns
      .iter()
      .map(|column| Field {
         name: column.name().to_string(),
         type_name: column.type_info().name().to_string(),
      })
      .collect()
}

/// Decode every column of `row`, keeping column order
pub(crate) fn to_record(row: &MySqlRow) -> Result<Record> {
   let mut record = Record::with_capacity(row.len());
   for (i, column) in row.columns().iter().enumerate() {
      record.insert(column.name().to_string(), to_value(row, i)?);
   }
   Ok(record)
}

fn to_value(row: &MySqlRow, i: usize) -> Result<Value> {
   let raw = row.try_get_raw(i)?;
   if raw.is_null() {
      return Ok(Value::Null);
   }

   let kind = kind_of(raw.type_info().name())?;

   // The kind comes from the wire type, so the unchecked getters are only
   // asked for representations the column actually carries.
   let value = match kind {
      Kind::Bool => Value::Bool(row.try_get_unchecked::<bool, _>(i)?),
      Kind::UInt => Value::UInt(row.try_get_unchecked::<u64, _>(i)?),
      Kind::Int => Value::Int(row.try_get_unchecked::<i64, _>(i)?),
      Kind::Float => Value::Float(f64::from(row.try_get_unchecked::<f32, _>(i)?)),
      Kind::Double => Value::Float(row.try_get_unchecked::<f64, _>(i)?),
      Kind::Text => Value::Text(row.try_get_unchecked::<String, _>(i)?),
      Kind::Bytes => Value::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
      Kind::Date => Value::Date(row.try_get_unchecked::<Date, _>(i)?),
      Kind::Time => Value::Time(row.try_get_unchecked::<Time, _>(i)?),
      Kind::DateTime => Value::DateTime(row.try_get_unchecked::<PrimitiveDateTime, _>(i)?),
   };

   Ok(value)
}
