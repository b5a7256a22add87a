//! # Zephyr Channel
//!
//! Market data fan-out for Zephyr exchange adapters.
//!
//! This crate provides:
//! - [`ChannelRegistry`] holding one [`Channel`] per name per exchange
//! - Symbol and timeframe keyed subscriptions with a wildcard sentinel
//! - A channel-wide [`ThrottleGate`] for consumers that opt into reduced delivery
//! - Configuration loading with YAML/TOML/JSON support and environment variable overrides
//! - Structured logging setup built on `tracing`

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

mod channel;
mod consumer;
mod error;
mod registry;
mod throttle;

/// Configuration management
pub mod config;

/// Logging initialization
pub mod logging;

/// Subscription storage
pub mod subscription;

/// Subscription key types
pub mod types;

pub use channel::Channel;
pub use config::BrokerConfig;
pub use consumer::{Consumer, same_consumer};
pub use error::{ChannelError, ConfigError, ErrorSeverity};
pub use registry::ChannelRegistry;
pub use subscription::{SubscriptionMode, SubscriptionTree};
pub use throttle::{GateState, ThrottleGate};
pub use types::{ExchangeContext, Symbol, Timeframe, WILDCARD};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::types::*;
    pub use crate::{Channel, ChannelError, ChannelRegistry, Consumer};
}
