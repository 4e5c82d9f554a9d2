use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

/// Initialize structured logging system
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// flushes the log file when dropped and must be kept alive until exit.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // Set up environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow::anyhow!("Failed to create log filter: {}", e))?;

    // Console layer, text or JSON
    let console_layer = if config.format == "json" {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .boxed()
    };

    let registry = Registry::default().with(env_filter).with(console_layer);

    // Add file layer if log file is specified
    let guard = if let Some(log_path) = config.file_path.as_deref().map(Path::new) {
        let directory = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file_name = log_path.file_name().map_or_else(
            || "chat-features.log".to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        let file_appender = rolling::daily(directory, file_name);
        let (non_blocking_appender, guard) = non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(true)
            .json();

        registry
            .with(file_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
        Some(guard)
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;
        None
    };

    info!(level = %config.level, format = %config.format, "Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    /// Stop the timer and log the elapsed time
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
        duration
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::debug!(operation = %self.operation, "Operation aborted");
        }
    }
}
