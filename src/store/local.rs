//! Client-library access to a local database file.
//!
//! Mirrors what a libSQL client does for `file:` URLs: every call is a
//! self-contained request whose result is returned fully materialised, and
//! the database is switched to write-ahead logging when opened.

use super::sqlite::collect;
use super::{ResultSet, Store, Value};
use crate::config::local_file_path;
use crate::schema::configure_local;
use anyhow::Result;
use rusqlite::Connection;

pub struct LocalClient {
    conn: Connection,
}

impl LocalClient {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(local_file_path(path))?;
        configure_local(&conn)?;
        Ok(Self { conn })
    }
}

impl Store for LocalClient {
    fn label(&self) -> &'static str {
        "libsql-local-sqlite"
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        // No statement cache: each request is parsed afresh, as it would be
        // when handed across a client boundary.
        let mut stmt = self.conn.prepare(sql)?;
        Ok(collect(&mut stmt, params)?)
    }
}
