//! Table definitions and the statements the benchmark issues.
//!
//! `example_users` accumulates synthetic rows across runs; `runs` is the
//! append-only log of timed phases. Neither is ever pruned.

use crate::store::Store;
use anyhow::{Context, Result};
use rusqlite::Connection;

pub const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS example_users (
    uid TEXT PRIMARY KEY,
    email TEXT
)";

pub const CREATE_RUNS_TABLE: &str = "CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    process_id INTEGER,
    start_time TIMESTAMP,
    end_time TIMESTAMP,
    duration FLOAT,
    num_rows INTEGER,
    query_type TEXT,
    driver TEXT
)";

pub const INSERT_USER: &str = "INSERT INTO example_users VALUES (?, ?)";

pub const SELECT_USERS: &str = "SELECT * FROM example_users LIMIT ?";

pub const INSERT_RUN: &str = "INSERT INTO runs \
    (process_id, start_time, end_time, duration, num_rows, query_type, driver) \
    VALUES (?, ?, ?, ?, ?, ?, ?)";

pub const SELECT_RUNS: &str = "SELECT id, process_id, start_time, end_time, duration, \
    num_rows, query_type, driver FROM runs ORDER BY id";

/// Create both tables if they do not exist yet. Safe to call repeatedly.
pub fn initialize(store: &mut dyn Store) -> Result<()> {
    store
        .execute(CREATE_USERS_TABLE, &[])
        .context("creating example_users table")?;
    store
        .execute(CREATE_RUNS_TABLE, &[])
        .context("creating runs table")?;
    log::debug!("Schema ready on {}", store.label());
    Ok(())
}

/// Switch a local database to write-ahead logging.
pub fn configure_local(conn: &Connection) -> Result<()> {
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        log::warn!("journal_mode is {mode}, WAL was requested");
    }
    Ok(())
}
