//! Subscriber setup for the `bftc` binary
//!
//! The library itself only emits `tracing` events; applications decide where
//! they go. This sets up stdout plus, when configured, a daily rolling file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{ClientError, ClientResult};

/// Default filter when `RUST_LOG` is not set.
pub fn default_filter(config: &LoggingConfig) -> &'static str {
    if config.debug {
        "bftc=debug"
    } else {
        "bftc=info"
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn init(config: &LoggingConfig) -> ClientResult<Option<WorkerGuard>> {
    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let prefix = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("bftc.log");

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(prefix)
                .max_log_files(config.max_files)
                .build(directory)
                .map_err(|e| ClientError::Config(format!("Log file setup failed: {}", e)))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(config).into()),
        )
        .try_init()
        .map_err(|e| ClientError::Config(format!("Logging already initialized: {}", e)))?;

    Ok(guard)
}
