//! Configuration traits for validation and environment overrides.

use crate::error::ConfigError;

/// Trait for types that can be validated after loading.
pub trait Validatable {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Trait for types that support environment variable overrides.
pub trait Configurable: Sized {
    /// Applies overrides read through `lookup`, keyed by variable name.
    fn apply_overrides<F>(&mut self, prefix: &str, lookup: F)
    where
        F: Fn(&str) -> Option<String>;

    /// Returns the variable names that can override this configuration.
    fn env_var_names(prefix: &str) -> Vec<String>;

    /// Applies overrides from the process environment.
    fn apply_env_overrides(&mut self, prefix: &str) {
        self.apply_overrides(prefix, |name| std::env::var(name).ok());
    }
}

/// Helpers for applying a single override value.
#[derive(Debug, Clone, Copy)]
pub struct EnvOverride;

impl EnvOverride {
    /// Overrides a string value.
    pub fn apply_string(value: Option<String>, target: &mut String) {
        if let Some(value) = value {
            *target = value;
        }
    }

    /// Overrides a numeric value; unparsable input is ignored.
    pub fn apply_number<T: std::str::FromStr>(value: Option<String>, target: &mut T) {
        if let Some(value) = value
            && let Ok(parsed) = value.trim().parse()
        {
            *target = parsed;
        }
    }

    /// Merges `NAME=VALUE,NAME=VALUE` pairs into a map of numbers.
    pub fn apply_number_map<T: std::str::FromStr>(
        value: Option<String>,
        target: &mut std::collections::HashMap<String, T>,
    ) {
        let Some(value) = value else {
            return;
        };
        for pair in value.split(',') {
            if let Some((k, v)) = pair.split_once('=')
                && let Ok(parsed) = v.trim().parse()
            {
                target.insert(k.trim().to_string(), parsed);
            }
        }
    }
}
