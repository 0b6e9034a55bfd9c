//! File-based diagnostic logging.
//!
//! The TUI owns the terminal, so logs go to ${PEEP_HOME}/logs instead of
//! stderr. Filtering follows the PEEP_LOG env var (EnvFilter syntax).

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initializes tracing with a daily-rotated log file under `logs_dir`.
///
/// Returns a guard that flushes buffered log lines on drop; keep it alive
/// for the lifetime of the process.
///
/// # Errors
/// Returns an error if the log directory cannot be created.
pub fn init_file_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let filter = EnvFilter::try_from_env("PEEP_LOG")
        .unwrap_or_else(|_| "peep=info,peep_core=info,peep_tui=info".into());

    let appender = tracing_appender::rolling::daily(logs_dir, "peep.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

/// Initializes tracing to stderr for non-interactive commands.
pub fn init_stderr_logging() {
    let filter = EnvFilter::try_from_env("PEEP_LOG")
        .unwrap_or_else(|_| "peep=warn,peep_core=warn,peep_tui=warn".into());

    // Ignore the error if a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
