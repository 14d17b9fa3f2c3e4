//! Scalar values bound to and decoded from MySQL statements.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use time::{Date, PrimitiveDateTime, Time};

/// A row returned from a query, or a record passed to a table helper.
///
/// Keys keep the order they were inserted in (column order for decoded rows).
pub type Record = IndexMap<String, Value>;

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
   #[default]
   Null,
   /// A field that is present in a record but carries no value.
   ///
   /// It can never be bound to a statement; `Table::sanitize` rewrites it to
   /// `Null` and reports a warning.
   Undefined,
   Bool(bool),
   Int(i64),
   UInt(u64),
   Float(f64),
   Text(String),
   Bytes(Vec<u8>),
   Date(Date),
   Time(Time),
   DateTime(PrimitiveDateTime),
}

impl Value {
   pub fn is_null(&self) -> bool {
      matches!(self, Value::Null)
   }

   pub fn is_undefined(&self) -> bool {
      matches!(self, Value::Undefined)
   }

   pub fn as_str(&self) -> Option<&str> {
      match self {
         Value::Text(s) => Some(s),
         _ => None,
      }
   }

   pub fn as_i64(&self) -> Option<i64> {
      match self {
         Value::Int(i) => Some(*i),
         Value::UInt(u) => i64::try_from(*u).ok(),
         Value::Bool(b) => Some(i64::from(*b)),
         _ => None,
      }
   }

   pub fn as_f64(&self) -> Option<f64> {
      match self {
         Value::Float(f) => Some(*f),
         Value::Int(i) => Some(*i as f64),
         Value::UInt(u) => Some(*u as f64),
         _ => None,
      }
   }

   /// Text content, decoding byte strings lossily.
   ///
   /// Metadata statements such as `DESCRIBE` return some columns as binary
   /// strings depending on the server version.
   pub(crate) fn to_text_lossy(&self) -> Option<String> {
      match self {
         Value::Text(s) => Some(s.clone()),
         Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
         _ => None,
      }
   }

   /// Convert to JSON. Bytes become base64 strings, temporal values ISO-like strings.
   pub fn to_json(&self) -> JsonValue {
      serde_json::to_value(self).unwrap_or(JsonValue::Null)
   }
}

fn format_date(date: &Date) -> String {
   format!(
      "{:04}-{:02}-{:02}",
      date.year(),
      u8::from(date.month()),
      date.day()
   )
}

fn format_time(time: &Time) -> String {
   let (h, m, s, micro) = time.as_hms_micro();
   if micro == 0 {
      format!("{h:02}:{m:02}:{s:02}")
   } else {
      format!("{h:02}:{m:02}:{s:02}.{micro:06}")
   }
}

impl Serialize for Value {
   fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
      match self {
         Value::Null | Value::Undefined => serializer.serialize_none(),
         Value::Bool(b) => serializer.serialize_bool(*b),
         Value::Int(i) => serializer.serialize_i64(*i),
         Value::UInt(u) => serializer.serialize_u64(*u),
         Value::Float(f) => serializer.serialize_f64(*f),
         Value::Text(s) => serializer.serialize_str(s),
         Value::Bytes(b) => serializer.serialize_str(&BASE64_STANDARD.encode(b)),
         Value::Date(d) => serializer.serialize_str(&format_date(d)),
         Value::Time(t) => serializer.serialize_str(&format_time(t)),
         Value::DateTime(dt) => serializer.serialize_str(&format!(
            "{} {}",
            format_date(&dt.date()),
            format_time(&dt.time())
         )),
      }
   }
}

macro_rules! impl_from {
   ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
      $(
         impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
               Value::$variant(<$target>::from(value))
            }
         }
      )*
   };
}

impl_from! {
   bool => Bool as bool,
   i8 => Int as i64,
   i16 => Int as i64,
   i32 => Int as i64,
   i64 => Int as i64,
   u8 => UInt as u64,
   u16 => UInt as u64,
   u32 => UInt as u64,
   u64 => UInt as u64,
   f32 => Float as f64,
   f64 => Float as f64,
   String => Text as String,
   &str => Text as String,
   &String => Text as String,
   Vec<u8> => Bytes as Vec<u8>,
   &[u8] => Bytes as Vec<u8>,
   Date => Date as Date,
   Time => Time as Time,
   PrimitiveDateTime => DateTime as PrimitiveDateTime,
}

impl<T: Into<Value>> From<Option<T>> for Value {
   fn from(value: Option<T>) -> Self {
      value.map_or(Value::Null, Into::into)
   }
}

impl From<JsonValue> for Value {
   fn from(value: JsonValue) -> Self {
      match value {
         JsonValue::Null => Value::Null,
         JsonValue::Bool(b) => Value::Bool(b),
         JsonValue::Number(n) => {
            // Preserve integer precision when possible
            if let Some(i) = n.as_i64() {
               Value::Int(i)
            } else if let Some(u) = n.as_u64() {
               Value::UInt(u)
            } else {
               Value::Float(n.as_f64().unwrap_or_default())
            }
         }
         JsonValue::String(s) => Value::Text(s),
         // MySQL JSON columns accept the serialized text
         other @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Text(other.to_string()),
      }
   }
}

/// Build a [`Record`] from `key => value` pairs.
///
/// ```
/// use sqlx_mysql_toolkit::{record, Value};
///
/// let row = record! { "id" => 1, "name" => "alice", "email" => None::<String> };
/// assert_eq!(row["email"], Value::Null);
/// ```
#[macro_export]
macro_rules! record {
   () => {
      $crate::Record::new()
   };
   ($($key:expr => $value:expr),+ $(,)?) => {{
      let mut record = $crate::Record::new();
      $(
         record.insert(::std::string::String::from($key), $crate::Value::from($value));
      )+
      record
   }};
}
