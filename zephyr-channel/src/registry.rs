//! Registry of channels keyed by exchange and channel name.

use dashmap::DashMap;
use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::channel::Channel;
use crate::config::BrokerConfig;
use crate::error::ChannelError;
use crate::types::ExchangeContext;

/// Holds at most one [`Channel`] per name per exchange.
///
/// The registry is constructed explicitly and shared by reference or `Arc`.
/// Registration is serialized per exchange; lookups run concurrently.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use zephyr_channel::{Channel, ChannelError, ChannelRegistry, ExchangeContext};
///
/// let registry = ChannelRegistry::new();
/// let ticker = Arc::new(Channel::new(ExchangeContext::new("binance"), "ticker"));
///
/// registry.register("binance", "ticker", ticker).unwrap();
/// assert!(registry.lookup("ticker", "binance").is_some());
/// assert!(registry.lookup("ticker", "okx").is_none());
///
/// let again = Arc::new(Channel::new(ExchangeContext::new("binance"), "ticker"));
/// assert!(matches!(
///     registry.register("binance", "ticker", again),
///     Err(ChannelError::DuplicateChannel { .. })
/// ));
/// ```
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: DashMap<String, HashMap<String, Arc<Channel>>>,
    config: BrokerConfig,
}

impl ChannelRegistry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose [`create_channel`](Self::create_channel)
    /// uses `config`.
    #[must_use]
    pub fn from_config(config: BrokerConfig) -> Self {
        Self {
            channels: DashMap::new(),
            config,
        }
    }

    /// Returns the broker configuration.
    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Registers `channel` as `channel_name` under `exchange_name`.
    ///
    /// On a duplicate the originally registered channel is kept.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::InvalidName`] if either name is empty
    /// - [`ChannelError::DuplicateChannel`] if the name is already taken
    pub fn register(
        &self,
        exchange_name: &str,
        channel_name: &str,
        channel: Arc<Channel>,
    ) -> Result<Arc<Channel>, ChannelError> {
        validate_name("exchange", exchange_name)?;
        validate_name("channel", channel_name)?;

        let mut by_name = self.channels.entry(exchange_name.to_string()).or_default();
        match by_name.entry(channel_name.to_string()) {
            hash_map::Entry::Occupied(_) => {
                error!(
                    exchange = exchange_name,
                    channel = channel_name,
                    "Channel already registered"
                );
                Err(ChannelError::DuplicateChannel {
                    exchange: exchange_name.to_string(),
                    channel: channel_name.to_string(),
                })
            }
            hash_map::Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&channel));
                info!(
                    exchange = exchange_name,
                    channel = channel_name,
                    threshold = channel.threshold(),
                    "Channel registered"
                );
                Ok(channel)
            }
        }
    }

    /// Registers `channel` under its own exchange and name.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_channel(&self, channel: Arc<Channel>) -> Result<Arc<Channel>, ChannelError> {
        let exchange = channel.exchange().name().to_string();
        let name = channel.name().to_string();
        self.register(&exchange, &name, channel)
    }

    /// Returns the channel registered as `channel_name` under `exchange_name`.
    ///
    /// A miss is logged at warn level.
    #[must_use]
    pub fn lookup(&self, channel_name: &str, exchange_name: &str) -> Option<Arc<Channel>> {
        let found = self
            .channels
            .get(exchange_name)
            .and_then(|by_name| by_name.get(channel_name).cloned());

        if found.is_none() {
            warn!(
                exchange = exchange_name,
                channel = channel_name,
                "Channel not found"
            );
        }
        found
    }

    /// Returns the registered channel, or registers the one built by `make`.
    ///
    /// `make` runs at most once, only if the name looked vacant, and without
    /// any registry lock held. If another thread registers the name first,
    /// its channel is returned and the one built by `make` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidName`] if either name is empty.
    pub fn get_or_register<F>(
        &self,
        exchange_name: &str,
        channel_name: &str,
        make: F,
    ) -> Result<Arc<Channel>, ChannelError>
    where
        F: FnOnce() -> Channel,
    {
        validate_name("exchange", exchange_name)?;
        validate_name("channel", channel_name)?;

        let existing = self
            .channels
            .get(exchange_name)
            .and_then(|by_name| by_name.get(channel_name).cloned());
        if let Some(existing) = existing {
            return Ok(existing);
        }

        // Built with no shard guard held so `make` may use the registry.
        let channel = Arc::new(make());

        let mut by_name = self.channels.entry(exchange_name.to_string()).or_default();
        match by_name.entry(channel_name.to_string()) {
            hash_map::Entry::Occupied(slot) => {
                debug!(
                    exchange = exchange_name,
                    channel = channel_name,
                    "Channel registered concurrently, discarding new instance"
                );
                Ok(Arc::clone(slot.get()))
            }
            hash_map::Entry::Vacant(slot) => {
                info!(
                    exchange = exchange_name,
                    channel = channel_name,
                    threshold = channel.threshold(),
                    "Channel registered"
                );
                Ok(Arc::clone(slot.insert(channel)))
            }
        }
    }

    /// Builds a channel with the configured threshold and registers it.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn create_channel(
        &self,
        exchange_name: &str,
        channel_name: &str,
    ) -> Result<Arc<Channel>, ChannelError> {
        let channel = Channel::from_config(
            ExchangeContext::new(exchange_name),
            channel_name,
            &self.config,
        );
        self.register(exchange_name, channel_name, Arc::new(channel))
    }

    /// Returns the channel names registered under `exchange_name`, sorted.
    #[must_use]
    pub fn channel_names(&self, exchange_name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .get(exchange_name)
            .map(|by_name| by_name.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Returns the exchanges with at least one channel, sorted.
    #[must_use]
    pub fn exchanges(&self) -> Vec<String> {
        let mut exchanges: Vec<String> = self
            .channels
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        exchanges.sort();
        exchanges
    }

    /// Returns the total number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.iter().map(|entry| entry.value().len()).sum()
    }

    /// Returns true if no channel is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_name(kind: &str, value: &str) -> Result<(), ChannelError> {
    if value.trim().is_empty() {
        debug!(kind, value, "Rejected empty name");
        return Err(ChannelError::invalid_name(kind, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::testing::RecordingConsumer;
    use crate::types::Symbol;
    use std::thread;

    fn channel(exchange: &str, name: &str) -> Arc<Channel> {
        Arc::new(Channel::new(ExchangeContext::new(exchange), name))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ChannelRegistry::new();
        let ticker = channel("binance", "ticker");

        let registered = registry.register("binance", "ticker", Arc::clone(&ticker)).unwrap();
        assert!(Arc::ptr_eq(&registered, &ticker));

        let found = registry.lookup("ticker", "binance").unwrap();
        assert!(Arc::ptr_eq(&found, &ticker));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_miss_returns_none() {
        let registry = ChannelRegistry::new();
        assert!(registry.lookup("ticker", "binance").is_none());

        registry.register("binance", "ticker", channel("binance", "ticker")).unwrap();
        assert!(registry.lookup("trades", "binance").is_none());
        assert!(registry.lookup("ticker", "okx").is_none());
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let registry = ChannelRegistry::new();
        let first = channel("binance", "ticker");
        registry.register("binance", "ticker", Arc::clone(&first)).unwrap();

        let err = registry
            .register("binance", "ticker", channel("binance", "ticker"))
            .unwrap_err();
        assert_eq!(
            err,
            ChannelError::DuplicateChannel {
                exchange: "binance".to_string(),
                channel: "ticker".to_string(),
            }
        );

        let found = registry.lookup("ticker", "binance").unwrap();
        assert!(Arc::ptr_eq(&found, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_name_on_different_exchanges() {
        let registry = ChannelRegistry::new();
        registry.register("binance", "ticker", channel("binance", "ticker")).unwrap();
        registry.register("okx", "ticker", channel("okx", "ticker")).unwrap();

        assert_eq!(registry.exchanges(), vec!["binance", "okx"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_names_rejected() {
        let registry = ChannelRegistry::new();

        let err = registry.register("", "ticker", channel("binance", "ticker")).unwrap_err();
        assert!(matches!(err, ChannelError::InvalidName { ref kind, .. } if kind == "exchange"));

        let err = registry.register("binance", " ", channel("binance", "ticker")).unwrap_err();
        assert!(matches!(err, ChannelError::InvalidName { ref kind, .. } if kind == "channel"));

        assert!(registry.is_empty());
        assert!(registry.exchanges().is_empty());
    }

    #[test]
    fn test_register_channel_uses_own_keys() {
        let registry = ChannelRegistry::new();
        registry.register_channel(channel("bybit", "candles")).unwrap();

        assert!(registry.lookup("candles", "bybit").is_some());
        assert!(registry.register_channel(channel("bybit", "candles")).is_err());
    }

    #[test]
    fn test_get_or_register_builds_once() {
        let registry = ChannelRegistry::new();
        let mut builds = 0;

        let first = registry
            .get_or_register("binance", "ticker", || {
                builds += 1;
                Channel::new(ExchangeContext::new("binance"), "ticker")
            })
            .unwrap();
        let second = registry
            .get_or_register("binance", "ticker", || {
                builds += 1;
                Channel::new(ExchangeContext::new("binance"), "ticker")
            })
            .unwrap();

        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_or_register_factory_can_use_registry() {
        let registry = Arc::new(ChannelRegistry::new());
        registry.create_channel("binance", "trades").unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let ticker = registry.get_or_register("binance", "ticker", || {
                    let trades = registry.lookup("trades", "binance");
                    let threshold = trades.map_or(1, |t| t.threshold());
                    Channel::with_threshold(ExchangeContext::new("binance"), "ticker", threshold)
                });
                let _ = tx.send(ticker.is_ok());
            })
        };

        let registered = rx.recv_timeout(std::time::Duration::from_secs(3));
        assert_eq!(registered, Ok(true));
        worker.join().unwrap();
        assert_eq!(registry.channel_names("binance"), vec!["ticker", "trades"]);
    }

    #[test]
    fn test_create_channel_uses_configured_threshold() {
        let mut config = BrokerConfig::default();
        config.default_threshold = 2;
        config.channel_thresholds.insert("candles".to_string(), 5);
        let registry = ChannelRegistry::from_config(config);

        let candles = registry.create_channel("binance", "candles").unwrap();
        let ticker = registry.create_channel("binance", "ticker").unwrap();

        assert_eq!(candles.threshold(), 5);
        assert_eq!(ticker.threshold(), 2);
        assert_eq!(candles.exchange().name(), "binance");
        assert_eq!(registry.channel_names("binance"), vec!["candles", "ticker"]);
        assert!(registry.channel_names("okx").is_empty());
        assert_eq!(registry.config().default_threshold, 2);
    }

    #[test]
    fn test_concurrent_register_single_winner() {
        let registry = Arc::new(ChannelRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry
                        .register("binance", "ticker", channel("binance", "ticker"))
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_shares_subscriptions() {
        let registry = ChannelRegistry::new();
        let ticker = registry.create_channel("binance", "ticker").unwrap();
        let btc = Symbol::new_unchecked("BTC-USDT");

        ticker
            .subscribe_symbol(RecordingConsumer::new("a", 0), btc.clone())
            .await
            .unwrap();

        let found = registry.lookup("ticker", "binance").unwrap();
        assert_eq!(found.publish(Some(&btc), None).len(), 1);
        found.has_sent();
    }
}
