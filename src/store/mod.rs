//! Database access behind a single `Store` trait.
//!
//! Three implementations, one per [`Target`] variant:
//! - [`sqlite::SqliteDriver`]: raw rusqlite connection with cached statements
//! - [`local::LocalClient`]: client-library style access to a local file (WAL)
//! - [`remote::RemoteClient`]: client-library style access to a hosted database over HTTP

pub mod local;
pub mod remote;
pub mod sqlite;

use crate::config::Target;
use anyhow::{Context, Result};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

/// A single SQL value, independent of the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// Fully materialised result of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by a write statement; zero for queries.
    pub rows_affected: u64,
}

impl ResultSet {
    /// Value at `(row, column name)`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// A connection to the benchmark target.
///
/// Implementations run each statement to completion before returning; no
/// statement is batched or deferred.
pub trait Store: Send {
    /// Value written to the `driver` column of run records.
    fn label(&self) -> &'static str;

    /// Execute one statement with positional `?` parameters.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet>;
}

/// Open a connection suitable for `target`.
pub fn open(target: &Target) -> Result<Box<dyn Store>> {
    let store: Box<dyn Store> = match target {
        Target::SqliteDriver { path } => Box::new(
            sqlite::SqliteDriver::open(path)
                .with_context(|| format!("opening sqlite database {path}"))?,
        ),
        Target::LibsqlLocal { path } => Box::new(
            local::LocalClient::open(path)
                .with_context(|| format!("opening local libsql database {path}"))?,
        ),
        Target::Remote { url, auth_token } => Box::new(
            remote::RemoteClient::connect(url, auth_token)
                .with_context(|| format!("connecting to {url}"))?,
        ),
    };
    Ok(store)
}
