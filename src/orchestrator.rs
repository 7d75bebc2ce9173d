//! Run orchestration: schema setup, parallel workers, ordered collection.
//!
//! The pipeline is linear and runs once:
//! initialize schema → dispatch workers → join all → hand results to the report.
//! There is no retry and no cancellation.

use crate::config::BenchConfig;
use crate::report::{load_history, HistoryStats};
use crate::schema;
use crate::store;
use crate::worker::{run_worker, WorkerOutput};
use anyhow::{anyhow, Context, Result};
use std::thread;
use std::time::{Duration, Instant};

/// Everything the report needs from one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Worker outputs, indexed by iteration.
    pub outputs: Vec<WorkerOutput>,
    /// Wall-clock time of the dispatch phase only.
    pub elapsed: Duration,
    pub description: &'static str,
    /// Aggregated contents of the `runs` table, when requested.
    pub history: Option<Vec<HistoryStats>>,
}

/// Create the schema on the configured target. Any failure here is fatal.
pub fn prepare(config: &BenchConfig) -> Result<()> {
    let mut store = store::open(&config.target).context("connecting for schema setup")?;
    schema::initialize(store.as_mut())?;
    log::info!("Schema initialized on {}", store.label());
    Ok(())
}

/// Run the whole benchmark described by `config`.
pub fn run(config: &BenchConfig) -> Result<RunSummary> {
    config.validate()?;

    if config.workers > 1 && config.target.is_local() {
        // No locking is done between workers; the run goes ahead regardless.
        log::warn!(
            "{} workers will write to the same local file without coordination; \
             results with more than one worker are not guaranteed",
            config.workers
        );
    }

    prepare(config)?;

    log::info!(
        "Dispatching {} worker(s): {} inserts, select limit {}",
        config.workers,
        config.insert_rows,
        config.select_rows
    );
    let started = Instant::now();
    let outputs = dispatch(config)?;
    let elapsed = started.elapsed();

    let history = if config.show_history {
        let mut store = store::open(&config.target).context("connecting for history")?;
        Some(load_history(store.as_mut())?)
    } else {
        None
    };

    Ok(RunSummary {
        outputs,
        elapsed,
        description: config.target.description(),
        history,
    })
}

/// Run one worker per iteration index on its own thread and wait for all.
///
/// Results come back in iteration order. Every worker is joined before an
/// error is reported; the first failing iteration's error wins.
pub fn dispatch(config: &BenchConfig) -> Result<Vec<WorkerOutput>> {
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.workers);
        for iteration in 0..config.workers {
            let handle = thread::Builder::new()
                .name(format!("bench-worker-{iteration}"))
                .spawn_scoped(scope, move || run_worker(config, iteration))
                .with_context(|| format!("spawning worker {iteration}"))?;
            handles.push(handle);
        }

        let joined: Vec<Result<WorkerOutput>> = handles
            .into_iter()
            .enumerate()
            .map(|(iteration, handle)| {
                handle
                    .join()
                    .map_err(|_| anyhow!("worker {iteration} panicked"))?
                    .with_context(|| format!("worker {iteration} failed"))
            })
            .collect();

        joined.into_iter().collect()
    })
}
