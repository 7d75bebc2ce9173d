//! log4rs setup: stderr always, plus an optional log file.

use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use std::env;

const LOGGING_PATTERN: &str = "{d} {l} {f}:{L} - {m}{n}";

/// Parse `BENCH_LOG_LEVEL`, falling back to `Info`.
pub fn level_from_env() -> LevelFilter {
    env::var("BENCH_LOG_LEVEL")
        .ok()
        .and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the global logger.
///
/// Records at `log_level` and above go to stderr. When `file_path` is given,
/// the same records are appended to that file as well. Stdout is left alone
/// for the benchmark report.
pub fn initialize_logger(log_level: LevelFilter, file_path: Option<&str>) -> anyhow::Result<()> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
        .build();

    let mut config_builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
            .build(path)?;
        config_builder =
            config_builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    let config = config_builder
        .build(root.build(log_level))
        .map_err(|e| anyhow::anyhow!("invalid logging configuration: {e}"))?;
    log4rs::init_config(config)?;

    Ok(())
}
