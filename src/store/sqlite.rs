//! Embedded driver: rusqlite directly on the database file.

use super::{ResultSet, Store, Value};
use crate::config::local_file_path;
use anyhow::Result;
use rusqlite::{params_from_iter, Connection, Statement};

/// Raw driver access. Statements are prepared once and cached on the
/// connection, so the insert loop pays for parsing only on its first row.
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(local_file_path(path))?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection (used by tests and benches).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Store for SqliteDriver {
    fn label(&self) -> &'static str {
        "sqlite"
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(collect(&mut stmt, params)?)
    }
}

/// Run a prepared statement to completion and materialise its output.
pub(crate) fn collect(stmt: &mut Statement<'_>, params: &[Value]) -> rusqlite::Result<ResultSet> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    if columns.is_empty() {
        let changed = stmt.execute(params_from_iter(params))?;
        return Ok(ResultSet {
            columns,
            rows: Vec::new(),
            rows_affected: changed as u64,
        });
    }

    let width = columns.len();
    let mut rows = Vec::new();
    let mut cursor = stmt.query(params_from_iter(params))?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(Value::from(row.get_ref(i)?));
        }
        rows.push(values);
    }

    Ok(ResultSet {
        columns,
        rows,
        rows_affected: 0,
    })
}
