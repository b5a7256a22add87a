//! Subscription storage for channels.
//!
//! A [`SubscriptionTree`] maps each symbol to either a flat consumer list or
//! a timeframe-keyed map of lists:
//!
//! ```text
//! "BTC-USDT" -> [c1, c2]                       (flat)
//! "ETH-USDT" -> { 1m -> [c3], 1h -> [c4, c5] } (nested)
//! "*"        -> [c6]                           (wildcard)
//! ```
//!
//! Subscribing with the wildcard symbol replaces every other entry. Lookups
//! for unknown keys create empty lists instead of failing.

mod tree;

pub(crate) use tree::Subscriber;
pub use tree::{SubscriptionMode, SubscriptionTree};
