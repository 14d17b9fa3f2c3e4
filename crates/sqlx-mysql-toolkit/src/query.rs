//! Parameter-safe query templates.
//!
//! A [`Query`] is an ordered list of SQL text fragments and parameter nodes.
//! Compiling it walks the nodes, emitting fragment text verbatim and a `?`
//! placeholder for every bound value, so values never end up inside the SQL
//! text.
//!
//! List parameters expand to one placeholder per element, which makes
//! `IN (...)` clauses work with a single binding:
//!
//! ```
//! use sqlx_mysql_toolkit::sql;
//!
//! let ids = vec![3, 5, 8];
//! let query = sql!("SELECT * FROM users WHERE id IN (" {ids} ") AND active = " {true});
//! let compiled = query.compile().unwrap();
//!
//! assert_eq!(compiled.sql, "SELECT * FROM users WHERE id IN (?,?,?) AND active = ?");
//! assert_eq!(compiled.params.len(), 4);
//! ```

use time::{Date, PrimitiveDateTime, Time};

use crate::{Error, Result, Value};

/// A value bound into a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
   /// Emits one placeholder
   Value(Value),
   /// Emits one placeholder per element, joined by commas
   List(Vec<Value>),
}

/// Conversion into a query parameter.
///
/// Scalars become [`Param::Value`]; `Vec<T>`, slices and arrays become
/// [`Param::List`]. A `Vec<u8>` is therefore a list of numbers; bind a byte
/// string as `Value::Bytes`.
pub trait IntoParam {
   fn into_param(self) -> Param;
}

impl IntoParam for Param {
   fn into_param(self) -> Param {
      self
   }
}

macro_rules! impl_scalar_param {
   ($($ty:ty),* $(,)?) => {
      $(
         impl IntoParam for $ty {
            fn into_param(self) -> Param {
               Param::Value(Value::from(self))
            }
         }
      )*
   };
}

impl_scalar_param!(
   Value,
   bool,
   i8,
   i16,
   i32,
   i64,
   u8,
   u16,
   u32,
   u64,
   f32,
   f64,
   String,
   &str,
   &String,
   Date,
   Time,
   PrimitiveDateTime,
);

impl<T: Into<Value>> IntoParam for Option<T> {
   fn into_param(self) -> Param {
      Param::Value(Value::from(self))
   }
}

impl<T: Into<Value>> IntoParam for Vec<T> {
   fn into_param(self) -> Param {
      Param::List(self.into_iter().map(Into::into).collect())
   }
}

impl<T: Into<Value> + Clone> IntoParam for &[T] {
   fn into_param(self) -> Param {
      Param::List(self.iter().cloned().map(Into::into).collect())
   }
}

impl<T: Into<Value>, const N: usize> IntoParam for [T; N] {
   fn into_param(self) -> Param {
      Param::List(self.into_iter().map(Into::into).collect())
   }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
   Sql(String),
   Param(Param),
}

/// A query expression: SQL fragments interleaved with parameters.
///
/// Build one with the [`sql!`](crate::sql) macro, the builder methods, or
/// [`Query::from_parts`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
   nodes: Vec<Node>,
}

/// The result of compiling a [`Query`]: SQL with `?` placeholders and the
/// flattened parameter list, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
   pub sql: String,
   pub params: Vec<Value>,
}

impl Query {
   pub fn new() -> Self {
      Self::default()
   }

   /// Build a query from literal fragments and the values between them.
   ///
   /// There must be exactly one more fragment than values: the text before
   /// the first value, between each pair, and after the last one (which may be
   /// empty).
   pub fn from_parts<S, I, P>(fragments: I, params: P) -> Result<Self>
   where
      S: Into<String>,
      I: IntoIterator<Item = S>,
      P: IntoIterator<Item = Param>,
   {
      let fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
      let params: Vec<Param> = params.into_iter().collect();

      if fragments.len() != params.len() + 1 {
         return Err(Error::Usage(format!(
            "a query with {} values needs {} text fragments, got {}",
            params.len(),
            params.len() + 1,
            fragments.len()
         )));
      }

      let mut nodes = Vec::with_capacity(fragments.len() + params.len());
      let mut params = params.into_iter();
      for fragment in fragments {
         nodes.push(Node::Sql(fragment));
         if let Some(param) = params.next() {
            nodes.push(Node::Param(param));
         }
      }

      Ok(Self { nodes })
   }

   /// Append literal SQL text
   pub fn push_sql(mut self, sql: impl Into<String>) -> Self {
      self.nodes.push(Node::Sql(sql.into()));
      self
   }

   /// Append a parameter (scalar or list)
   pub fn bind(mut self, value: impl IntoParam) -> Self {
      self.nodes.push(Node::Param(value.into_param()));
      self
   }

   /// Append a list parameter from any iterator of values
   pub fn bind_list<I>(self, values: I) -> Self
   where
      I: IntoIterator,
      I::Item: Into<Value>,
   {
      self.bind(Param::List(values.into_iter().map(Into::into).collect()))
   }

   /// Compile into SQL text with `?` placeholders and a flat parameter list.
   ///
   /// Fails with a usage error on an empty list parameter, which would
   /// otherwise produce something like `IN ()`.
   pub fn compile(&self) -> Result<CompiledQuery> {
      let mut sql = String::new();
      let mut params = Vec::new();

      for (index, node) in self.nodes.iter().enumerate() {
         match node {
            Node::Sql(text) => sql.push_str(text),
            Node::Param(Param::Value(value)) => {
               sql.push('?');
               params.push(value.clone());
            }
            Node::Param(Param::List(values)) => {
               if values.is_empty() {
                  return Err(Error::Usage(format!(
                     "list parameter after \"{}\" is empty",
                     preceding_text(&self.nodes[..index]).trim()
                  )));
               }
               sql.push_str(&placeholders(values.len()));
               params.extend(values.iter().cloned());
            }
         }
      }

      Ok(CompiledQuery { sql, params })
   }
}

/// `n` comma-separated `?` placeholders
pub(crate) fn placeholders(n: usize) -> String {
   vec!["?"; n].join(",")
}

fn preceding_text(nodes: &[Node]) -> &str {
   match nodes.last() {
      Some(Node::Sql(text)) => text,
      _ => "",
   }
}

/// Build a [`Query`] from string literals interleaved with `{expr}` values.
///
/// Each value goes through [`IntoParam`]: scalars bind one placeholder,
/// vectors, slices and arrays expand to a comma-separated list.
///
/// ```
/// use sqlx_mysql_toolkit::sql;
///
/// let name = "alice";
/// let query = sql!("SELECT id FROM users WHERE name = " {name} " LIMIT 1");
/// assert_eq!(query.compile().unwrap().sql, "SELECT id FROM users WHERE name = ? LIMIT 1");
/// ```
#[macro_export]
macro_rules! sql {
   (@acc $query:expr ;) => {
      $query
   };
   (@acc $query:expr ; $text:literal $($rest:tt)*) => {
      $crate::sql!(@acc $query.push_sql($text) ; $($rest)*)
   };
   (@acc $query:expr ; { $value:expr } $($rest:tt)*) => {
      $crate::sql!(@acc $query.bind($value) ; $($rest)*)
   };
   ($($rest:tt)*) => {
      $crate::sql!(@acc $crate::Query::new() ; $($rest)*)
   };
}
