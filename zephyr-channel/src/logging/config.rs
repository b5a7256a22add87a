//! Broker logging settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::rolling::Rotation;

/// Filter used when neither `RUST_LOG` nor a configured filter applies.
///
/// Broker lifecycle events (registration, subscriptions, lookup misses) are
/// logged at info/warn; per-round publish records are at trace and stay off.
pub const DEFAULT_FILTER: &str = "warn,zephyr_channel=info";

/// File name used for the broker's log files.
pub const DEFAULT_FILE_NAME: &str = "zephyr-channel.log";

/// Logging section of the broker configuration.
///
/// ```yaml
/// logging:
///   filter: "warn,zephyr_channel=debug"
///   format: pretty
///   file:
///     directory: /var/log/zephyr
///     rotation: hourly
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,

    /// Stdout format. Files are always JSON.
    pub format: LogFormat,

    /// Write records to stdout.
    pub stdout: bool,

    /// Optional rolling file output.
    pub file: Option<FileLogConfig>,

    /// Record thread ids, useful when several producers share a channel.
    pub thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Json,
            stdout: true,
            file: None,
            thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Returns true if at least one output is enabled.
    #[must_use]
    pub fn has_output(&self) -> bool {
        self.stdout || self.file.is_some()
    }
}

/// Stdout record format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per record.
    #[default]
    Json,
    /// Multi-line human-readable records.
    Pretty,
}

/// Rolling file output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// Directory holding the log files, created if missing.
    pub directory: PathBuf,

    /// Base file name; rotated files get a date suffix.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Rotation period.
    #[serde(default)]
    pub rotation: LogRotation,
}

impl FileLogConfig {
    /// Creates a daily-rotated file output in `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file_name: default_file_name(),
            rotation: LogRotation::default(),
        }
    }
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// New file every hour.
    Hourly,
    /// New file every day.
    #[default]
    Daily,
    /// Single file.
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}
