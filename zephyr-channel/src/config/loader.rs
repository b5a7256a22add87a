//! Configuration loader supporting YAML, TOML and JSON.

use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

use super::traits::{Configurable, Validatable};
use crate::error::ConfigError;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml)
    #[default]
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "yaml" | "yml" => Some(Self::Yaml),
                "toml" => Some(Self::Toml),
                "json" => Some(Self::Json),
                _ => None,
            })
    }
}

/// Loads, overrides and validates configuration values.
///
/// Loading runs in three steps: parse, apply environment overrides (when a
/// prefix is set), validate (unless disabled).
///
/// # Example
///
/// ```no_run
/// use zephyr_channel::config::{BrokerConfig, ConfigLoader};
///
/// let config: BrokerConfig = ConfigLoader::new()
///     .with_env_prefix("ZEPHYR_CHANNEL")
///     .load_file("broker.yaml")?;
/// # Ok::<(), zephyr_channel::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: Option<String>,
    validate: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with validation enabled and no env prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_prefix: None,
            validate: true,
        }
    }

    /// Sets the environment variable prefix for overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets whether to validate after loading. Default is `true`.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Returns the environment variable prefix, if set.
    #[must_use]
    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Loads configuration from a file, detecting the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized, the file cannot be
    /// read, the content cannot be parsed, or validation fails.
    pub fn load_file<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Validatable + Configurable,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason: "Unrecognized file extension. Supported: .yaml, .yml, .toml, .json".to_string(),
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), ?format, "Loading configuration file");
        self.load_str(&content, format)
    }

    /// Loads configuration from a string in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be parsed or validation fails.
    pub fn load_str<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Validatable + Configurable,
    {
        let mut config: T = Self::parse(content, format)?;
        if let Some(prefix) = &self.env_prefix {
            config.apply_env_overrides(prefix);
        }
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }

    fn parse<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidFormat {
            path: "<string>".to_string(),
            reason,
        };
        match format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| invalid(format!("YAML parse error: {e}")))
            }
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| invalid(format!("TOML parse error: {e}")))
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| invalid(format!("JSON parse error: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        threshold: u32,
    }

    impl Validatable for TestConfig {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.threshold == 0 {
                return Err(ConfigError::invalid_value("threshold", "must be >= 1"));
            }
            Ok(())
        }
    }

    impl Configurable for TestConfig {
        fn apply_overrides<F>(&mut self, prefix: &str, lookup: F)
        where
            F: Fn(&str) -> Option<String>,
        {
            if let Some(value) = lookup(&format!("{prefix}_THRESHOLD"))
                && let Ok(parsed) = value.parse()
            {
                self.threshold = parsed;
            }
        }

        fn env_var_names(prefix: &str) -> Vec<String> {
            vec![format!("{prefix}_THRESHOLD")]
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.yml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.TOML")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("a.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_str_all_formats() {
        let loader = ConfigLoader::new();
        let yaml: TestConfig = loader.load_str("threshold: 2\n", ConfigFormat::Yaml).unwrap();
        let toml: TestConfig = loader.load_str("threshold = 3\n", ConfigFormat::Toml).unwrap();
        let json: TestConfig = loader
            .load_str("{\"threshold\": 4}", ConfigFormat::Json)
            .unwrap();

        assert_eq!(yaml.threshold, 2);
        assert_eq!(toml.threshold, 3);
        assert_eq!(json.threshold, 4);
    }

    #[test]
    fn test_load_str_parse_error() {
        let err = ConfigLoader::new()
            .load_str::<TestConfig>("threshold: [", ConfigFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { .. }));
        assert!(err.to_string().contains("YAML"));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let strict = ConfigLoader::new().load_str::<TestConfig>("threshold: 0", ConfigFormat::Yaml);
        assert!(matches!(strict, Err(ConfigError::InvalidValue { .. })));

        let lenient = ConfigLoader::new()
            .with_validation(false)
            .load_str::<TestConfig>("threshold: 0", ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(lenient.threshold, 0);
    }

    #[test]
    fn test_env_prefix() {
        let loader = ConfigLoader::new().with_env_prefix("ZEPHYR_CHANNEL");
        assert_eq!(loader.env_prefix(), Some("ZEPHYR_CHANNEL"));
        assert_eq!(ConfigLoader::new().env_prefix(), None);
        assert_eq!(
            TestConfig::env_var_names("ZEPHYR_CHANNEL"),
            vec!["ZEPHYR_CHANNEL_THRESHOLD".to_string()]
        );
    }

    #[test]
    fn test_missing_prefix_vars_leave_config_untouched() {
        let config: TestConfig = ConfigLoader::new()
            .with_env_prefix("ZEPHYR_CHANNEL_TEST_NONEXISTENT_8231")
            .load_str("threshold: 5", ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(config.threshold, 5);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broker.toml");
        std::fs::write(&path, "threshold = 9\n").unwrap();

        let config: TestConfig = ConfigLoader::new().load_file(&path).unwrap();
        assert_eq!(config.threshold, 9);
    }

    #[test]
    fn test_load_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let err = ConfigLoader::new()
            .load_file::<TestConfig, _>(dir.path().join("broker.ini"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { .. }));

        let err = ConfigLoader::new()
            .load_file::<TestConfig, _>(dir.path().join("missing.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
