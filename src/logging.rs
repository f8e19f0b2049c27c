use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

pub const LOG_FILE: &str = "wpm.log";

/// Filter from `WPM_LOG`, then `RUST_LOG`, else `warn`.
pub fn log_filter() -> EnvFilter {
    let level = std::env::var("WPM_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Send tracing output to a log file in `dir`.
///
/// Returns the writer guard; log lines still buffered are lost once it drops.
/// Logging is optional, so any failure just leaves tracing disabled.
pub fn init_in(dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(dir).ok()?;

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

pub fn init() -> Option<WorkerGuard> {
    init_in(&AppDirs::log_dir()?)
}
