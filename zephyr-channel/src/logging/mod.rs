//! Structured logging setup.
//!
//! The broker itself only emits `tracing` events. Binaries embedding it can
//! call [`init_logging`] to install a subscriber built from [`LogConfig`]:
//! - JSON or pretty stdout output
//! - JSON rolling file output
//! - `RUST_LOG` takes precedence over the configured filter

mod config;

pub use config::{
    DEFAULT_FILE_NAME, DEFAULT_FILTER, FileLogConfig, LogConfig, LogFormat, LogRotation,
};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

/// Initializes the global `tracing` subscriber.
///
/// Returns the guard of the non-blocking file writer when file output is
/// enabled; keep it alive until shutdown so buffered records are flushed.
///
/// # Errors
///
/// Returns an error if no output is enabled, the filter is invalid, the log
/// file cannot be opened, or a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use zephyr_channel::logging::{LogConfig, init_logging};
///
/// let _guard = init_logging(&LogConfig::default()).expect("logging");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    if !config.has_output() {
        return Err(LoggingError::InvalidConfig(
            "stdout and file output are both disabled".to_string(),
        ));
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| LoggingError::InvalidConfig(format!("filter '{}': {e}", config.filter)))?,
    };

    let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();
    if config.stdout {
        layers.push(stdout_layer(config));
    }

    let guard = match &config.file {
        Some(file) => {
            let (layer, guard) = file_layer(config, file)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

fn stdout_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(config.thread_ids);

    match config.format {
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

fn file_layer<S>(
    config: &LogConfig,
    file: &FileLogConfig,
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard), LoggingError>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(&file.directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(file.rotation.into())
        .filename_prefix(&file.file_name)
        .build(&file.directory)
        .map_err(|e| LoggingError::InvalidConfig(format!("log file: {e}")))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .json()
        .flatten_event(true)
        .boxed();

    Ok((layer, guard))
}

/// Errors that can occur during logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid logging configuration: {0}")]
    InvalidConfig(String),

    /// A global subscriber is already set
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        // Only reached when RUST_LOG is unset.
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LogConfig {
            filter: "zephyr_channel=loud".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LogConfig {
            stdout: false,
            ..LogConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_init_with_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let config = LogConfig {
            stdout: false,
            file: Some(FileLogConfig {
                rotation: LogRotation::Never,
                ..FileLogConfig::new(&log_dir)
            }),
            ..LogConfig::default()
        };

        let guard = init_logging(&config).unwrap();
        assert!(guard.is_some());
        assert!(log_dir.is_dir());

        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, LoggingError::AlreadyInitialized(_)));
    }
}
