//! Broker configuration.
//!
//! Configuration files may be YAML, TOML or JSON; the format is picked from
//! the file extension. Values can be overridden with `ZEPHYR_CHANNEL_*`
//! environment variables.
//!
//! # Example YAML
//!
//! ```yaml
//! default_threshold: 1
//! channel_thresholds:
//!   order_book: 5
//! logging:
//!   filter: "warn,zephyr_channel=info"
//!   format: pretty
//! ```

mod broker;
mod loader;
mod traits;

pub use broker::{BrokerConfig, ENV_PREFIX};
pub use loader::{ConfigFormat, ConfigLoader};
pub use traits::{Configurable, EnvOverride, Validatable};
