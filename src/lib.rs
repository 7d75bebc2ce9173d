//! SQLite / libSQL Insert-Select Latency Benchmark
//!
//! Measures how long it takes to insert rows one statement at a time and to
//! read a bounded number of them back, against one of three targets:
//! - **sqlite**: the embedded SQLite driver on a local file
//! - **libsql-local**: a libSQL-style client on a local file (WAL mode)
//! - **turso**: a libSQL-style client talking to a hosted database over HTTP
//!
//! Every timed phase is appended to a `runs` table in the same database, so
//! results accumulate across invocations.
//!
//! Run the benchmark: `cargo run --release`
//! Run benchmarks: `cargo bench`
//! Run tests: `cargo test`

pub mod config;
pub mod error;
pub mod faker;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod schema;
pub mod store;
pub mod worker;
