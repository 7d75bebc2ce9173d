//! Typed error families.
//!
//! Configuration and remote-client failures get their own enums so callers
//! (and tests) can match on them. Everything else in the run pipeline is an
//! [`anyhow::Error`] carrying the originating library's message.

use thiserror::Error;

/// Errors raised while building a [`BenchConfig`][crate::config::BenchConfig].
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// `BENCH_MODE` named something other than the three supported targets.
    #[error("unknown benchmark mode {0:?} (expected sqlite, libsql-local or turso)")]
    UnknownMode(String),
    /// A numeric variable could not be parsed.
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    /// A variable that must be present was missing or blank.
    #[error("{0} must be set for this mode")]
    Missing(&'static str),
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("local database path must not be empty")]
    EmptyPath,
    /// The remote endpoint does not use a scheme the client can speak.
    #[error("unsupported remote URL {0:?} (expected libsql://, https:// or http://)")]
    UnsupportedUrl(String),
}

/// Errors raised by the remote client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-success status.
    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The store accepted the request but rejected the statement.
    #[error("statement failed: {message}")]
    Statement {
        message: String,
        code: Option<String>,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("unsupported value type {0:?} in result set")]
    UnsupportedValue(&'static str),
}
