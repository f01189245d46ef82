//! File-based logging setup.
//!
//! Logs go to daily-rolling files under `$GRADEX_HOME/logs`, never to the
//! terminal: the TUI owns the screen and the line mode reserves stdout for
//! event output. Level comes from the `GRADEX_LOG` env var (default `info`).

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// The returned guard flushes buffered log lines on drop; hold it for the
/// process lifetime.
///
/// # Errors
/// Returns an error when the log directory cannot be created or a
/// subscriber is already installed.
pub fn init() -> Result<WorkerGuard> {
    let logs_dir = crate::config::paths::logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&logs_dir, "gradex.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env("GRADEX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}
