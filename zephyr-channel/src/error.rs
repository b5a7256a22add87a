//! Error types for channel registration, subscription and configuration.
//!
//! Lookup misses are not errors: they are reported as `None` or as an empty
//! consumer list. Everything in this module is a structural failure that the
//! caller must handle synchronously.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::subscription::SubscriptionMode;

/// Error severity levels for categorizing broker errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// The caller's startup sequence cannot continue.
    Fatal,

    /// The operation failed but the broker state is unchanged.
    #[default]
    Recoverable,
}

impl ErrorSeverity {
    /// Returns true if this error is fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns true if this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Returns the severity as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by channels and the channel registry.
///
/// # Examples
///
/// ```
/// use zephyr_channel::ChannelError;
///
/// let err = ChannelError::DuplicateChannel {
///     exchange: "binance".to_string(),
///     channel: "ticker".to_string(),
/// };
/// assert!(err.to_string().contains("ticker"));
/// assert!(err.severity().is_fatal());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelError {
    /// A channel with this name is already registered for the exchange.
    #[error("[Channel] Channel '{channel}' already registered for exchange '{exchange}'")]
    DuplicateChannel {
        /// Exchange the channel was registered under.
        exchange: String,
        /// Name of the duplicated channel.
        channel: String,
    },

    /// An exchange or channel name was empty.
    #[error("[Channel] Invalid {kind} name '{value}'")]
    InvalidName {
        /// What was being named ("exchange" or "channel").
        kind: String,
        /// The rejected value.
        value: String,
    },

    /// A symbol string failed validation.
    #[error("[Channel] Invalid symbol '{value}': {reason}")]
    InvalidSymbol {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timeframe string could not be parsed.
    #[error("[Channel] Invalid timeframe '{value}'")]
    InvalidTimeframe {
        /// The rejected value.
        value: String,
    },

    /// A subscription asked for a different shape than the symbol already has.
    #[error("[Channel] Symbol '{symbol}' is subscribed as {existing}, cannot add a {requested} subscription")]
    SubscriptionModeMismatch {
        /// Symbol whose entry already exists.
        symbol: String,
        /// Shape of the existing entry.
        existing: SubscriptionMode,
        /// Shape requested by the failed call.
        requested: SubscriptionMode,
    },

    /// Broker configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ChannelError {
    /// Returns the severity of this error.
    #[must_use]
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateChannel { .. } | Self::Config(_) => ErrorSeverity::Fatal,
            Self::InvalidName { .. }
            | Self::InvalidSymbol { .. }
            | Self::InvalidTimeframe { .. }
            | Self::SubscriptionModeMismatch { .. } => ErrorSeverity::Recoverable,
        }
    }

    /// Creates an invalid name error.
    #[must_use]
    pub fn invalid_name(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidName {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid symbol error.
    #[must_use]
    pub fn invalid_symbol(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSymbol {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration error type.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// Configuration value is invalid.
    #[error("[Config] Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field with the invalid value.
        field: String,
        /// Reason why the value is invalid.
        reason: String,
    },

    /// Configuration file could not be read.
    #[error("[Config] Failed to read file '{path}': {reason}")]
    FileReadError {
        /// Path to the configuration file.
        path: String,
        /// Reason for the read failure.
        reason: String,
    },

    /// Configuration file format is invalid.
    #[error("[Config] Invalid format in '{path}': {reason}")]
    InvalidFormat {
        /// Path to the configuration file.
        path: String,
        /// Reason for the format error.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the name of the field involved, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            Self::FileReadError { .. } | Self::InvalidFormat { .. } => None,
        }
    }
}
