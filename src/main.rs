//! Benchmark runner: loads configuration, runs every worker and prints the report.
//!
//! Usage:
//!   cargo run --release
//!   BENCH_MODE=sqlite BENCH_INSERT_ROWS=5000 cargo run --release
//!   BENCH_MODE=turso TURSO_URL=libsql://db.turso.io TURSO_AUTH_TOKEN=... cargo run --release
//!
//! Variables may also be placed in a `.env` file in the working directory.

use libsql_bench::config::BenchConfig;
use libsql_bench::logging::{initialize_logger, level_from_env};
use libsql_bench::orchestrator;
use libsql_bench::report::print_report;
use std::process;

fn main() {
    // A missing .env file is fine; variables may come from the shell.
    let dotenv = dotenvy::dotenv();

    let log_file = std::env::var("BENCH_LOG_FILE").ok();
    initialize_logger(level_from_env(), log_file.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {e}. Exiting.");
        process::exit(1);
    });

    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    let config = match BenchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}. Exiting.");
            process::exit(1);
        }
    };
    log::info!("Benchmark target: {:?}", config.target);

    match orchestrator::run(&config) {
        Ok(summary) => print_report(&summary),
        Err(e) => {
            log::error!("Benchmark failed: {e:#}");
            process::exit(1);
        }
    }
}
