//! Key types for channel subscriptions.
//!
//! - [`Symbol`] - primary subscription key, including the wildcard sentinel
//! - [`Timeframe`] - optional secondary key nested under a symbol
//! - [`ExchangeContext`] - identifies the exchange that owns a channel

mod exchange;
mod symbol;
mod timeframe;

pub use exchange::ExchangeContext;
pub use symbol::{Symbol, WILDCARD};
pub use timeframe::Timeframe;
