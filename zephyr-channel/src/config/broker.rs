//! Top-level broker configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::loader::ConfigLoader;
use super::traits::{Configurable, EnvOverride, Validatable};
use crate::error::ConfigError;
use crate::logging::LogConfig;
use crate::throttle::ThrottleGate;

/// Environment variable prefix used by [`BrokerConfig::load`].
pub const ENV_PREFIX: &str = "ZEPHYR_CHANNEL";

/// Broker configuration.
///
/// | Field | Env override |
/// |-------|--------------|
/// | `default_threshold` | `ZEPHYR_CHANNEL_DEFAULT_THRESHOLD` |
/// | `channel_thresholds` | `ZEPHYR_CHANNEL_CHANNEL_THRESHOLDS` (`name=n,name=n`) |
/// | `logging.filter` | `ZEPHYR_CHANNEL_LOG_FILTER` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Throttle threshold for channels without an override.
    #[serde(default = "default_threshold")]
    pub default_threshold: u32,

    /// Per-channel-name threshold overrides.
    #[serde(default)]
    pub channel_thresholds: HashMap<String, u32>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            channel_thresholds: HashMap::new(),
            logging: LogConfig::default(),
        }
    }
}

const fn default_threshold() -> u32 {
    ThrottleGate::DEFAULT_THRESHOLD
}

impl BrokerConfig {
    /// Loads the configuration from `path` with `ZEPHYR_CHANNEL_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::new().with_env_prefix(ENV_PREFIX).load_file(path)
    }

    /// Returns the threshold for the named channel.
    #[must_use]
    pub fn threshold_for(&self, channel: &str) -> u32 {
        self.channel_thresholds
            .get(channel)
            .copied()
            .unwrap_or(self.default_threshold)
    }
}

impl Validatable for BrokerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_threshold == 0 {
            return Err(ConfigError::invalid_value(
                "default_threshold",
                "must be at least 1",
            ));
        }
        // Sorted so the reported field is deterministic.
        let mut overrides: Vec<_> = self.channel_thresholds.iter().collect();
        overrides.sort();
        for (channel, threshold) in overrides {
            if channel.is_empty() {
                return Err(ConfigError::invalid_value(
                    "channel_thresholds",
                    "channel name is empty",
                ));
            }
            if *threshold == 0 {
                return Err(ConfigError::invalid_value(
                    format!("channel_thresholds.{channel}"),
                    "must be at least 1",
                ));
            }
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.filter", "is empty"));
        }
        if !self.logging.has_output() {
            return Err(ConfigError::invalid_value(
                "logging",
                "stdout and file output are both disabled",
            ));
        }
        Ok(())
    }
}

impl Configurable for BrokerConfig {
    fn apply_overrides<F>(&mut self, prefix: &str, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        EnvOverride::apply_number(
            lookup(&format!("{prefix}_DEFAULT_THRESHOLD")),
            &mut self.default_threshold,
        );
        EnvOverride::apply_number_map(
            lookup(&format!("{prefix}_CHANNEL_THRESHOLDS")),
            &mut self.channel_thresholds,
        );
        EnvOverride::apply_string(
            lookup(&format!("{prefix}_LOG_FILTER")),
            &mut self.logging.filter,
        );
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        vec![
            format!("{prefix}_DEFAULT_THRESHOLD"),
            format!("{prefix}_CHANNEL_THRESHOLDS"),
            format!("{prefix}_LOG_FILTER"),
        ]
    }
}
