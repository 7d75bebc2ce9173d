//! Benchmark configuration.
//!
//! Defaults are compile-time constants; every field can be overridden from
//! the environment (a `.env` file is loaded by `main` through `dotenvy`).
//!
//! | Variable            | Meaning                                   | Default                     |
//! |---------------------|-------------------------------------------|-----------------------------|
//! | `BENCH_MODE`        | `sqlite`, `libsql-local` or `turso`       | `libsql-local`              |
//! | `BENCH_DB_PATH`     | local database file                       | `file:./turso-benchmark.db` |
//! | `TURSO_URL`         | remote endpoint (turso mode only)         | -                           |
//! | `TURSO_AUTH_TOKEN`  | remote auth token (turso mode only)       | -                           |
//! | `BENCH_WORKERS`     | parallel workers                          | 1                           |
//! | `BENCH_INSERT_ROWS` | rows inserted per worker                  | 1000                        |
//! | `BENCH_SELECT_ROWS` | row limit of the select phase             | 1                           |
//! | `BENCH_SEED`        | seed for the synthetic row generator      | entropy                     |
//! | `BENCH_HISTORY`     | print aggregated history after the run    | off                         |

use crate::error::ConfigError;
use std::env;
use std::fmt;

pub const DEFAULT_DB_PATH: &str = "file:./turso-benchmark.db";
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_INSERT_ROWS: usize = 1000;
pub const DEFAULT_SELECT_ROWS: usize = 1;

/// Where the benchmark runs. Each variant carries exactly the fields its
/// connection needs.
#[derive(Clone, PartialEq, Eq)]
pub enum Target {
    /// Raw embedded SQLite driver on a local file.
    SqliteDriver { path: String },
    /// libSQL-style client over a local file (WAL journal).
    LibsqlLocal { path: String },
    /// libSQL-style client over HTTP to a hosted database.
    Remote { url: String, auth_token: String },
}

impl Target {
    /// Label stored in the `driver` column of every run record.
    pub fn label(&self) -> &'static str {
        match self {
            Target::SqliteDriver { .. } => "sqlite",
            Target::LibsqlLocal { .. } => "libsql-local-sqlite",
            Target::Remote { .. } => "turso",
        }
    }

    /// One-line description printed at the end of the report.
    pub fn description(&self) -> &'static str {
        match self {
            Target::SqliteDriver { .. } => "Using sqlite driver on local sqlite",
            Target::LibsqlLocal { .. } => "Using libsql driver on local sqlite",
            Target::Remote { .. } => "Using libsql driver on Turso",
        }
    }

    /// Whether the target is a plain local file with no cross-worker coordination.
    pub fn is_local(&self) -> bool {
        !matches!(self, Target::Remote { .. })
    }
}

// Hand-written so the auth token never reaches the logs.
impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::SqliteDriver { path } => {
                f.debug_struct("SqliteDriver").field("path", path).finish()
            }
            Target::LibsqlLocal { path } => {
                f.debug_struct("LibsqlLocal").field("path", path).finish()
            }
            Target::Remote { url, .. } => f
                .debug_struct("Remote")
                .field("url", url)
                .field("auth_token", &"<redacted>")
                .finish(),
        }
    }
}

/// Immutable run configuration shared by the orchestrator and every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub target: Target,
    pub workers: usize,
    pub insert_rows: usize,
    pub select_rows: usize,
    /// Seed for the row generator. Each worker derives its own stream from it.
    pub seed: Option<u64>,
    pub show_history: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            target: Target::LibsqlLocal {
                path: DEFAULT_DB_PATH.to_string(),
            },
            workers: DEFAULT_WORKERS,
            insert_rows: DEFAULT_INSERT_ROWS,
            select_rows: DEFAULT_SELECT_ROWS,
            seed: None,
            show_history: false,
        }
    }
}

impl BenchConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, or `None` when unset.
    ///
    /// # Returns
    /// * `Ok(config)` when every present variable is valid.
    /// * `Err(ConfigError)` on the first invalid or missing value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let path = get("BENCH_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let mode = get("BENCH_MODE").unwrap_or_else(|| "libsql-local".to_string());

        let target = match mode.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite-driver" => Target::SqliteDriver { path },
            "libsql-local" | "libsql" | "local" => Target::LibsqlLocal { path },
            "turso" | "remote" => Target::Remote {
                url: get("TURSO_URL").ok_or(ConfigError::Missing("TURSO_URL"))?,
                auth_token: get("TURSO_AUTH_TOKEN")
                    .ok_or(ConfigError::Missing("TURSO_AUTH_TOKEN"))?,
            },
            _ => return Err(ConfigError::UnknownMode(mode)),
        };

        let number = |var: &'static str, default: usize| -> Result<usize, ConfigError> {
            match get(var) {
                None => Ok(default),
                Some(value) => value
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
            }
        };

        let seed = match get("BENCH_SEED") {
            None => None,
            Some(value) => Some(value.parse::<u64>().map_err(|_| {
                ConfigError::InvalidNumber {
                    var: "BENCH_SEED",
                    value,
                }
            })?),
        };

        let show_history = get("BENCH_HISTORY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        let config = Self {
            target,
            workers: number("BENCH_WORKERS", DEFAULT_WORKERS)?,
            insert_rows: number("BENCH_INSERT_ROWS", DEFAULT_INSERT_ROWS)?,
            select_rows: number("BENCH_SELECT_ROWS", DEFAULT_SELECT_ROWS)?,
            seed,
            show_history,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that the type system does not already enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        match &self.target {
            Target::SqliteDriver { path } | Target::LibsqlLocal { path } => {
                if local_file_path(path).trim().is_empty() {
                    return Err(ConfigError::EmptyPath);
                }
            }
            Target::Remote { url, auth_token } => {
                if url.trim().is_empty() {
                    return Err(ConfigError::Missing("TURSO_URL"));
                }
                if auth_token.trim().is_empty() {
                    return Err(ConfigError::Missing("TURSO_AUTH_TOKEN"));
                }
                let supported = ["libsql://", "https://", "http://"]
                    .iter()
                    .any(|scheme| url.starts_with(scheme));
                if !supported {
                    return Err(ConfigError::UnsupportedUrl(url.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Strip an optional `file:` URI prefix from a local database location.
pub fn local_file_path(path: &str) -> &str {
    path.strip_prefix("file:").unwrap_or(path)
}
