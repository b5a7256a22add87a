//! Exchange identification carried by each channel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the exchange that owns a channel.
///
/// The broker never interprets it; it is used for logging and as the default
/// registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeContext {
    name: String,
}

impl ExchangeContext {
    /// Creates a context for the named exchange.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the exchange name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ExchangeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for ExchangeContext {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
