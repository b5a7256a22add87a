//! Named market data channel for one exchange.
//!
//! A [`Channel`] owns a [`SubscriptionTree`] and a [`ThrottleGate`]. Producers
//! drive it through a publish round:
//!
//! 1. [`Channel::publish`] records the attempt and returns the consumers
//!    eligible for this round, in registration order
//! 2. the producer dispatches to each returned consumer
//! 3. [`Channel::has_sent`] closes the round
//!
//! [`Channel::notify`] runs the whole round with a dispatch closure.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::config::BrokerConfig;
use crate::consumer::Consumer;
use crate::error::ChannelError;
use crate::subscription::{Subscriber, SubscriptionMode, SubscriptionTree};
use crate::throttle::{GateState, ThrottleGate};
use crate::types::{ExchangeContext, Symbol, Timeframe, WILDCARD};

/// Pub/sub node routing publish rounds to consumers by symbol and timeframe.
///
/// # Thread Safety
///
/// `Channel` is `Send + Sync` and is shared as `Arc<Channel>`. The tree sits
/// behind a `RwLock` and the gate behind a `Mutex`. Neither lock is held while
/// a consumer's `run` hook is awaited.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use std::sync::Arc;
/// use zephyr_channel::{Channel, Consumer, ExchangeContext, Symbol};
///
/// struct Printer;
///
/// #[async_trait]
/// impl Consumer for Printer {
///     async fn run(&self) {}
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let channel = Channel::new(ExchangeContext::new("binance"), "ticker");
/// let btc = Symbol::new("BTC-USDT").unwrap();
///
/// channel.subscribe(Arc::new(Printer), Some(btc.clone()), None).await.unwrap();
///
/// let consumers = channel.publish(Some(&btc), None);
/// assert_eq!(consumers.len(), 1);
/// channel.has_sent();
/// # }
/// ```
#[derive(Debug)]
pub struct Channel {
    name: String,
    exchange: ExchangeContext,
    tree: RwLock<SubscriptionTree>,
    gate: Mutex<ThrottleGate>,
}

impl Channel {
    /// Creates a channel with the default threshold of 1.
    #[must_use]
    pub fn new(exchange: ExchangeContext, name: impl Into<String>) -> Self {
        Self::with_threshold(exchange, name, ThrottleGate::DEFAULT_THRESHOLD)
    }

    /// Creates a channel whose throttled consumers join every `threshold`th attempt.
    #[must_use]
    pub fn with_threshold(
        exchange: ExchangeContext,
        name: impl Into<String>,
        threshold: u32,
    ) -> Self {
        let name = name.into();
        debug!(channel = %name, exchange = %exchange, threshold, "Creating channel");
        Self {
            name,
            exchange,
            tree: RwLock::new(SubscriptionTree::new()),
            gate: Mutex::new(ThrottleGate::new(threshold)),
        }
    }

    /// Creates a channel using the threshold configured for `name`.
    #[must_use]
    pub fn from_config(
        exchange: ExchangeContext,
        name: impl Into<String>,
        config: &BrokerConfig,
    ) -> Self {
        let name = name.into();
        let threshold = config.threshold_for(&name);
        Self::with_threshold(exchange, name, threshold)
    }

    /// Returns the channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning exchange.
    #[must_use]
    pub fn exchange(&self) -> &ExchangeContext {
        &self.exchange
    }

    /// Returns the throttle threshold.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.gate.lock().threshold()
    }

    // -------- registration --------

    /// Subscribes `consumer` and awaits its `run` hook.
    ///
    /// - `symbol` of `None` or the wildcard **replaces every existing entry**
    ///   with a single wildcard entry holding `consumer`.
    /// - a concrete `symbol` appends to that symbol's list.
    /// - a `timeframe` nests the subscription one level deeper.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::SubscriptionModeMismatch` if the symbol already
    /// holds consumers subscribed with the other shape. Nothing is inserted
    /// and `run` is not called in that case.
    pub async fn subscribe(
        &self,
        consumer: Arc<dyn Consumer>,
        symbol: Option<Symbol>,
        timeframe: Option<Timeframe>,
    ) -> Result<(), ChannelError> {
        let symbol = symbol.unwrap_or_else(Symbol::wildcard);
        {
            let mut tree = self.tree.write();
            tree.insert(Subscriber::new(Arc::clone(&consumer)), &symbol, timeframe)?;
        }

        consumer.run().await;

        info!(
            channel = %self.name,
            exchange = %self.exchange,
            consumer = consumer.name(),
            timeframe = ?timeframe,
            "Consumer started for symbol {symbol}"
        );
        Ok(())
    }

    /// Subscribes `consumer` to every symbol, replacing existing entries.
    pub async fn subscribe_all(&self, consumer: Arc<dyn Consumer>) -> Result<(), ChannelError> {
        self.subscribe(consumer, None, None).await
    }

    /// Subscribes `consumer` to `symbol`.
    pub async fn subscribe_symbol(
        &self,
        consumer: Arc<dyn Consumer>,
        symbol: Symbol,
    ) -> Result<(), ChannelError> {
        self.subscribe(consumer, Some(symbol), None).await
    }

    /// Subscribes `consumer` to `symbol` at `timeframe`.
    pub async fn subscribe_timeframe(
        &self,
        consumer: Arc<dyn Consumer>,
        symbol: Symbol,
        timeframe: Timeframe,
    ) -> Result<(), ChannelError> {
        self.subscribe(consumer, Some(symbol), Some(timeframe))
            .await
    }

    /// Removes one reference to `consumer` from the given list.
    ///
    /// The consumer itself is left untouched. Returns `true` if it was found.
    pub fn unsubscribe(
        &self,
        consumer: &Arc<dyn Consumer>,
        symbol: Option<&Symbol>,
        timeframe: Option<Timeframe>,
    ) -> bool {
        let symbol = Symbol::or_wildcard(symbol);
        let removed = self.tree.write().remove(consumer, &symbol, timeframe);
        if removed {
            info!(
                channel = %self.name,
                exchange = %self.exchange,
                consumer = consumer.name(),
                symbol = %symbol,
                timeframe = ?timeframe,
                "Consumer unsubscribed"
            );
        }
        removed
    }

    // -------- publish round --------

    /// Records a publish attempt.
    pub fn will_send(&self) {
        self.gate.lock().will_send();
    }

    /// Returns the consumers of `symbol` eligible for the current round.
    ///
    /// `None` looks up the wildcard entry. An unknown symbol gets an empty
    /// list created for it. Always-on consumers are always included;
    /// throttled consumers only when the gate is open.
    #[must_use]
    pub fn consumers_for(&self, symbol: Option<&Symbol>) -> Vec<Arc<dyn Consumer>> {
        let symbol = Symbol::or_wildcard(symbol);
        let subscribers = {
            let tree = self.tree.read();
            tree.get_flat(&symbol).map(<[Subscriber]>::to_vec)
        };
        let subscribers =
            subscribers.unwrap_or_else(|| self.tree.write().flat_or_insert(&symbol).to_vec());
        self.select(&subscribers)
    }

    /// Returns the consumers of `symbol` at `timeframe` eligible for the current round.
    ///
    /// Same rules as [`consumers_for`](Self::consumers_for), one level deeper.
    #[must_use]
    pub fn consumers_for_timeframe(
        &self,
        timeframe: Timeframe,
        symbol: Option<&Symbol>,
    ) -> Vec<Arc<dyn Consumer>> {
        let symbol = Symbol::or_wildcard(symbol);
        let subscribers = {
            let tree = self.tree.read();
            tree.get_timeframe(&symbol, timeframe)
                .map(<[Subscriber]>::to_vec)
        };
        let subscribers = subscribers.unwrap_or_else(|| {
            self.tree
                .write()
                .timeframe_or_insert(&symbol, timeframe)
                .to_vec()
        });
        self.select(&subscribers)
    }

    /// Starts a publish round and returns the consumers to dispatch to.
    ///
    /// The caller must call [`has_sent`](Self::has_sent) once dispatch is done.
    #[must_use]
    pub fn publish(
        &self,
        symbol: Option<&Symbol>,
        timeframe: Option<Timeframe>,
    ) -> Vec<Arc<dyn Consumer>> {
        self.will_send();
        let consumers = match timeframe {
            Some(tf) => self.consumers_for_timeframe(tf, symbol),
            None => self.consumers_for(symbol),
        };
        trace!(
            channel = %self.name,
            symbol = symbol.map_or(WILDCARD, Symbol::as_str),
            timeframe = ?timeframe,
            consumers = consumers.len(),
            "Publish round"
        );
        consumers
    }

    /// Closes a publish round, resetting the gate if it was open.
    pub fn has_sent(&self) {
        if self.gate.lock().has_sent() {
            trace!(channel = %self.name, "Throttle gate reset");
        }
    }

    /// Runs a full publish round, calling `dispatch` for each eligible consumer.
    ///
    /// Returns the number of consumers dispatched to.
    pub fn notify<F>(
        &self,
        symbol: Option<&Symbol>,
        timeframe: Option<Timeframe>,
        mut dispatch: F,
    ) -> usize
    where
        F: FnMut(&Arc<dyn Consumer>),
    {
        let consumers = self.publish(symbol, timeframe);
        for consumer in &consumers {
            dispatch(consumer);
        }
        self.has_sent();
        consumers.len()
    }

    // -------- introspection --------

    /// Returns a snapshot of the throttle gate.
    #[must_use]
    pub fn gate_state(&self) -> GateState {
        self.gate.lock().state()
    }

    /// Returns the subscribed symbol keys, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.tree.read().symbols()
    }

    /// Returns the shape of the entry for `symbol`, if one exists.
    #[must_use]
    pub fn subscription_mode(&self, symbol: &Symbol) -> Option<SubscriptionMode> {
        self.tree.read().mode(symbol)
    }

    /// Returns the total number of subscriptions.
    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.tree.read().consumer_count()
    }

    fn select(&self, subscribers: &[Subscriber]) -> Vec<Arc<dyn Consumer>> {
        let gate_open = self.gate.lock().observe();
        subscribers
            .iter()
            .filter(|s| s.admits(gate_open))
            .map(|s| Arc::clone(&s.consumer))
            .collect()
    }
}
