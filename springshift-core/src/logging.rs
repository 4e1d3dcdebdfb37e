//! Logging infrastructure for springshift
//!
//! Logs are written to `~/.local/state/springshift/springshift.log` following XDG standards.
//!
//! Everything a run logs sits under a [`run_span`] carrying the source root,
//! so interleaved runs in one log file can be told apart.

use crate::config::{Config, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Base name of the rolling log file
pub const LOG_FILE_NAME: &str = "springshift.log";

/// Initialize the logging system
///
/// Sets up tracing with:
/// - File output to XDG state directory
/// - Log rotation
/// - Configurable log level via config or RUST_LOG env var
pub fn init(config: &LoggingConfig) -> crate::error::Result<LoggingGuard> {
    let log_dir = Config::state_dir();

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        version = env!("CARGO_PKG_VERSION"),
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Span covering one invocation.
///
/// `provider` starts empty; record it once the LLM client is configured.
pub fn run_span(root: &Path, dry_run: bool) -> tracing::Span {
    tracing::info_span!(
        "run",
        root = %root.display(),
        dry_run,
        provider = tracing::field::Empty
    )
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns the log file path
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let path = log_file_path();
        assert!(path.ends_with(LOG_FILE_NAME));
    }

    #[test]
    fn test_run_span_fields() {
        init_test();
        let span = run_span(Path::new("./java-codebase"), true);
        span.record("provider", "ollama");

        let meta = span.metadata().expect("run span has metadata");
        assert_eq!(meta.name(), "run");
        for field in ["root", "dry_run", "provider"] {
            assert!(meta.fields().field(field).is_some(), "missing {field}");
        }
    }
}
