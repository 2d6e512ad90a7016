//! Tracing subscriber setup.
//!
//! Console output always; a daily-rolling file under the logs directory when
//! `[logging] file = true`.

use crate::paths::ParleyPaths;
use parley_core::config::LoggingConfig;
use parley_core::error::{ParleyError, Result};
pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "parley.log";

/// Builds the filter: `RUST_LOG` wins over the configured directive.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init(config: &LoggingConfig, paths: &ParleyPaths) -> Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt::layer().with_target(true));

    if !config.file {
        registry
            .try_init()
            .map_err(|e| ParleyError::config(format!("Failed to install subscriber: {}", e)))?;
        return Ok(None);
    }

    let logs_dir = paths.logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;
    let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    registry
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .map_err(|e| ParleyError::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!("[Logging] Writing logs to {}", logs_dir.display());
    Ok(Some(guard))
}
