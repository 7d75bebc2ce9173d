//! One benchmark iteration: timed inserts, a timed select, two run records.

use crate::config::BenchConfig;
use crate::faker::{DataRow, Faker};
use crate::schema::{INSERT_RUN, INSERT_USER, SELECT_USERS};
use crate::store::{self, ResultSet, Store, Value};
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Which phase a [`RunRecord`] measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryType {
    Insert,
    Select,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Insert => "insert",
            QueryType::Select => "select",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "insert" => Some(QueryType::Insert),
            "select" => Some(QueryType::Select),
            _ => None,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the `runs` table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub process_id: u32,
    /// UNIX epoch seconds.
    pub start_time: f64,
    /// UNIX epoch seconds, never earlier than `start_time`.
    pub end_time: f64,
    /// Seconds, measured on a monotonic clock.
    pub duration: f64,
    pub num_rows: usize,
    pub query_type: QueryType,
    pub driver: String,
}

impl RunRecord {
    fn params(&self) -> [Value; 7] {
        [
            Value::from(self.process_id),
            Value::from(self.start_time),
            Value::from(self.end_time),
            Value::from(self.duration),
            Value::from(self.num_rows),
            Value::from(self.query_type.as_str()),
            Value::from(self.driver.as_str()),
        ]
    }

    /// Append this record to the `runs` table.
    pub fn persist(&self, store: &mut dyn Store) -> Result<()> {
        store
            .execute(INSERT_RUN, &self.params())
            .with_context(|| format!("recording {} run", self.query_type))?;
        Ok(())
    }

    /// Decode a row produced by [`SELECT_RUNS`][crate::schema::SELECT_RUNS].
    pub fn from_row(rs: &ResultSet, row: usize) -> Result<Self> {
        let num = |col: &str| {
            rs.get(row, col)
                .and_then(Value::as_f64)
                .ok_or_else(|| anyhow!("runs row {row}: {col} is not numeric"))
        };
        let text = |col: &str| {
            rs.get(row, col)
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("runs row {row}: {col} is not text"))
        };

        let query_type = text("query_type")?;
        Ok(Self {
            process_id: num("process_id")? as u32,
            start_time: num("start_time")?,
            end_time: num("end_time")?,
            duration: num("duration")?,
            num_rows: num("num_rows")? as usize,
            query_type: QueryType::parse(query_type)
                .ok_or_else(|| anyhow!("runs row {row}: unknown query_type {query_type:?}"))?,
            driver: text("driver")?.to_string(),
        })
    }
}

/// Pairs a wall-clock start with a monotonic timer.
struct Stopwatch {
    wall_start: f64,
    started: Instant,
}

impl Stopwatch {
    fn start() -> Self {
        Self {
            wall_start: epoch_seconds(),
            started: Instant::now(),
        }
    }

    /// Returns `(start_time, end_time, duration)` in seconds.
    fn stop(self) -> (f64, f64, f64) {
        let duration = self.started.elapsed().as_secs_f64();
        (self.wall_start, self.wall_start + duration, duration)
    }
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Seed of the row generator used by worker `iteration`.
pub fn worker_seed(seed: Option<u64>, iteration: usize) -> Option<u64> {
    seed.map(|s| s ^ (iteration as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Everything one worker produced.
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    pub iteration: usize,
    pub pid: u32,
    pub insert: RunRecord,
    pub select: RunRecord,
    /// Rows returned by the select phase.
    pub selected: Vec<DataRow>,
    /// Human-readable summary, one line per phase.
    pub lines: Vec<String>,
}

/// Connect to the configured target and run one iteration on it.
pub fn run_worker(config: &BenchConfig, iteration: usize) -> Result<WorkerOutput> {
    let mut store = store::open(&config.target)?;
    run_iteration(store.as_mut(), config, iteration)
}

/// Run one iteration against an already open store.
///
/// Inserts `config.insert_rows` rows one statement at a time, then selects
/// at most `config.select_rows` rows. Each phase is timed on its own and
/// logged as a [`RunRecord`]. Any failure aborts the iteration.
pub fn run_iteration(
    store: &mut dyn Store,
    config: &BenchConfig,
    iteration: usize,
) -> Result<WorkerOutput> {
    let pid = std::process::id();
    let driver = store.label().to_string();
    let mut faker = Faker::new(worker_seed(config.seed, iteration));
    let mut lines = Vec::with_capacity(2);

    log::debug!("Iteration {iteration}: inserting {} rows via {driver}", config.insert_rows);

    // Insert phase
    let watch = Stopwatch::start();
    for _ in 0..config.insert_rows {
        let DataRow { uid, email } = faker.row();
        store
            .execute(INSERT_USER, &[Value::Text(uid), Value::Text(email)])
            .context("inserting example_users row")?;
    }
    let (start_time, end_time, duration) = watch.stop();
    lines.push(format!(
        "Pid {pid}: Iteration {iteration}: Elapsed time to insert {} rows: {duration:.6} seconds",
        config.insert_rows
    ));
    let insert = RunRecord {
        process_id: pid,
        start_time,
        end_time,
        duration,
        num_rows: config.insert_rows,
        query_type: QueryType::Insert,
        driver: driver.clone(),
    };
    insert.persist(store)?;

    // Select phase
    let watch = Stopwatch::start();
    let rs = store
        .execute(SELECT_USERS, &[Value::from(config.select_rows)])
        .context("selecting example_users rows")?;
    let (start_time, end_time, duration) = watch.stop();
    lines.push(format!(
        "Pid {pid}: Iteration {iteration}: Elapsed time to select {} rows: {duration:.6} seconds",
        rs.rows.len()
    ));
    let select = RunRecord {
        process_id: pid,
        start_time,
        end_time,
        duration,
        num_rows: rs.rows.len(),
        query_type: QueryType::Select,
        driver,
    };
    select.persist(store)?;

    let selected = (0..rs.rows.len())
        .filter_map(|i| {
            Some(DataRow {
                uid: rs.get(i, "uid")?.as_str()?.to_string(),
                email: rs.get(i, "email")?.as_str()?.to_string(),
            })
        })
        .collect();

    log::debug!("Iteration {iteration}: done");

    Ok(WorkerOutput {
        iteration,
        pid,
        insert,
        select,
        selected,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{initialize, SELECT_RUNS};
    use crate::store::sqlite::SqliteDriver;
    use rusqlite::Connection;

    fn memory_store() -> SqliteDriver {
        let mut driver = SqliteDriver::from_connection(Connection::open_in_memory().unwrap());
        initialize(&mut driver).unwrap();
        driver
    }

    fn config(insert_rows: usize, select_rows: usize) -> BenchConfig {
        BenchConfig {
            insert_rows,
            select_rows,
            seed: Some(1),
            ..BenchConfig::default()
        }
    }

    #[test]
    fn records_both_phases() {
        let mut store = memory_store();
        let out = run_iteration(&mut store, &config(5, 1), 0).unwrap();

        assert_eq!(out.insert.num_rows, 5);
        assert_eq!(out.insert.query_type, QueryType::Insert);
        assert_eq!(out.select.num_rows, 1);
        assert_eq!(out.select.query_type, QueryType::Select);
        assert_eq!(out.insert.driver, "sqlite");
        assert_eq!(out.lines.len(), 2);
        assert!(out.lines[0].contains("Elapsed time to insert 5 rows"));
        assert!(out.lines[1].contains("Elapsed time to select 1 rows"));

        let runs = store.execute(SELECT_RUNS, &[]).unwrap();
        assert_eq!(runs.rows.len(), 2);
        let first = RunRecord::from_row(&runs, 0).unwrap();
        assert_eq!(first, out.insert);
    }

    #[test]
    fn select_returns_all_rows_when_fewer_than_limit() {
        let mut store = memory_store();
        let out = run_iteration(&mut store, &config(3, 10), 0).unwrap();
        assert_eq!(out.select.num_rows, 3);
        assert_eq!(out.selected.len(), 3);
    }

    #[test]
    fn zero_inserts_still_records_two_runs() {
        let mut store = memory_store();
        let out = run_iteration(&mut store, &config(0, 1), 0).unwrap();
        assert_eq!(out.insert.num_rows, 0);
        assert_eq!(out.select.num_rows, 0);
        let runs = store.execute(SELECT_RUNS, &[]).unwrap();
        assert_eq!(runs.rows.len(), 2);
    }

    #[test]
    fn timings_are_ordered() {
        let mut store = memory_store();
        let out = run_iteration(&mut store, &config(20, 5), 0).unwrap();
        for record in [&out.insert, &out.select] {
            assert!(record.duration >= 0.0);
            assert!(record.end_time >= record.start_time);
        }
        assert!(out.select.start_time >= out.insert.start_time);
    }

    #[test]
    fn missing_schema_is_fatal() {
        let mut store = SqliteDriver::from_connection(Connection::open_in_memory().unwrap());
        let err = run_iteration(&mut store, &config(1, 1), 0).unwrap_err();
        assert!(format!("{err:#}").contains("example_users"));
    }

    #[test]
    fn query_type_parses_its_own_labels() {
        for q in [QueryType::Insert, QueryType::Select] {
            assert_eq!(QueryType::parse(q.as_str()), Some(q));
        }
        assert_eq!(QueryType::parse("update"), None);
    }
}
