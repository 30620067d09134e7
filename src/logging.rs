//! Logging setup for `taskgraph` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `--verbose`, which means `debug`
//! 3. `TASKGRAPH_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `warn`
//!
//! Logs go to stderr so that `--format json` output on stdout stays
//! machine-readable.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no flag sets the level
pub const LOG_ENV: &str = "TASKGRAPH_LOG";

/// Initialise global logging subscriber.
///
/// Call once at startup; later calls are ignored.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool) -> Result<()> {
    let level = resolve_level(cli_level, verbose, std::env::var(LOG_ENV).ok().as_deref());

    // `try_init` fails only when a subscriber is already installed
    let _ = fmt()
        .with_max_level(level)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();

    Ok(())
}

fn resolve_level(
    cli_level: Option<LogLevel>,
    verbose: bool,
    env_value: Option<&str>,
) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None if verbose => tracing::Level::DEBUG,
        None => env_value
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::WARN),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
