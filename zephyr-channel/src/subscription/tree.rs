//! Symbol/timeframe subscription tree.
//!
//! Each symbol maps to either a flat consumer list or a per-timeframe map of
//! consumer lists. Lists keep insertion order, which is the dispatch order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::consumer::{Consumer, same_consumer};
use crate::error::ChannelError;
use crate::types::{Symbol, Timeframe};

/// Shape of a symbol entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionMode {
    /// Consumers are keyed by symbol only.
    Flat,
    /// Consumers are keyed by symbol and timeframe.
    Nested,
}

impl SubscriptionMode {
    const fn for_timeframe(timeframe: Option<Timeframe>) -> Self {
        if timeframe.is_some() {
            Self::Nested
        } else {
            Self::Flat
        }
    }
}

impl fmt::Display for SubscriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Nested => write!(f, "nested"),
        }
    }
}

/// A consumer together with the `filter_size` captured at registration.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub(crate) consumer: Arc<dyn Consumer>,
    pub(crate) filter_size: u32,
}

impl Subscriber {
    pub(crate) fn new(consumer: Arc<dyn Consumer>) -> Self {
        let filter_size = consumer.filter_size();
        Self {
            consumer,
            filter_size,
        }
    }

    /// Returns true if this subscriber should be notified for the round.
    pub(crate) const fn admits(&self, gate_open: bool) -> bool {
        self.filter_size == 0 || gate_open
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("consumer", &self.consumer.name())
            .field("filter_size", &self.filter_size)
            .finish()
    }
}

const NO_SUBSCRIBERS: &[Subscriber] = &[];

#[derive(Debug)]
enum SymbolEntry {
    Flat(Vec<Subscriber>),
    Nested(HashMap<Timeframe, Vec<Subscriber>>),
}

impl SymbolEntry {
    fn empty(mode: SubscriptionMode) -> Self {
        match mode {
            SubscriptionMode::Flat => Self::Flat(Vec::new()),
            SubscriptionMode::Nested => Self::Nested(HashMap::new()),
        }
    }

    const fn mode(&self) -> SubscriptionMode {
        match self {
            Self::Flat(_) => SubscriptionMode::Flat,
            Self::Nested(_) => SubscriptionMode::Nested,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Flat(list) => list.len(),
            Self::Nested(by_timeframe) => by_timeframe.values().map(Vec::len).sum(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Switches an entry holding no consumers to `mode`.
    fn reshape_if_empty(&mut self, mode: SubscriptionMode) {
        if self.mode() != mode && self.is_empty() {
            *self = Self::empty(mode);
        }
    }
}

/// Per-channel subscription tree.
///
/// Only a wildcard insert ever removes entries: it resets the whole tree to
/// the single wildcard entry. Lookups never fall back to the wildcard entry.
#[derive(Debug, Default)]
pub struct SubscriptionTree {
    by_symbol: HashMap<Symbol, SymbolEntry>,
}

impl SubscriptionTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a subscriber under `symbol`, and under `timeframe` if given.
    pub(crate) fn insert(
        &mut self,
        subscriber: Subscriber,
        symbol: &Symbol,
        timeframe: Option<Timeframe>,
    ) -> Result<(), ChannelError> {
        let requested = SubscriptionMode::for_timeframe(timeframe);

        if symbol.is_wildcard() && !self.by_symbol.is_empty() {
            debug!(
                dropped_symbols = self.by_symbol.len(),
                "Wildcard subscription resets symbol entries"
            );
            self.by_symbol.clear();
        }

        let entry = self
            .by_symbol
            .entry(symbol.clone())
            .or_insert_with(|| SymbolEntry::empty(requested));
        entry.reshape_if_empty(requested);

        match (entry, timeframe) {
            (SymbolEntry::Flat(list), None) => list.push(subscriber),
            (SymbolEntry::Nested(by_timeframe), Some(tf)) => {
                by_timeframe.entry(tf).or_default().push(subscriber);
            }
            (existing, _) => {
                return Err(ChannelError::SubscriptionModeMismatch {
                    symbol: symbol.to_string(),
                    existing: existing.mode(),
                    requested,
                });
            }
        }
        Ok(())
    }

    /// Removes `consumer` from the list at `symbol` (and `timeframe`).
    ///
    /// Returns `true` if a reference was removed. Only the first matching
    /// reference is removed; the order of the others is kept.
    pub(crate) fn remove(
        &mut self,
        consumer: &Arc<dyn Consumer>,
        symbol: &Symbol,
        timeframe: Option<Timeframe>,
    ) -> bool {
        let list = match (self.by_symbol.get_mut(symbol), timeframe) {
            (Some(SymbolEntry::Flat(list)), None) => list,
            (Some(SymbolEntry::Nested(by_timeframe)), Some(tf)) => match by_timeframe.get_mut(&tf) {
                Some(list) => list,
                None => return false,
            },
            _ => return false,
        };

        match list.iter().position(|s| same_consumer(&s.consumer, consumer)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the flat list for `symbol`, or `None` if the symbol is unknown
    /// or holds an empty nested entry.
    pub(crate) fn get_flat(&self, symbol: &Symbol) -> Option<&[Subscriber]> {
        match self.by_symbol.get(symbol)? {
            SymbolEntry::Flat(list) => Some(list.as_slice()),
            SymbolEntry::Nested(by_timeframe) if by_timeframe.values().all(Vec::is_empty) => None,
            SymbolEntry::Nested(_) => {
                warn!(symbol = %symbol, "Symbol is subscribed by timeframe, flat lookup is empty");
                Some(NO_SUBSCRIBERS)
            }
        }
    }

    /// Returns the flat list for `symbol`, creating an empty one on miss.
    pub(crate) fn flat_or_insert(&mut self, symbol: &Symbol) -> &[Subscriber] {
        let entry = self
            .by_symbol
            .entry(symbol.clone())
            .or_insert_with(|| SymbolEntry::empty(SubscriptionMode::Flat));
        entry.reshape_if_empty(SubscriptionMode::Flat);

        match entry {
            SymbolEntry::Flat(list) => list.as_slice(),
            SymbolEntry::Nested(_) => {
                warn!(symbol = %symbol, "Symbol is subscribed by timeframe, flat lookup is empty");
                NO_SUBSCRIBERS
            }
        }
    }

    /// Returns the list for `symbol`/`timeframe`, or `None` if either is unknown
    /// or the symbol holds an empty flat entry.
    pub(crate) fn get_timeframe(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Option<&[Subscriber]> {
        match self.by_symbol.get(symbol)? {
            SymbolEntry::Nested(by_timeframe) => by_timeframe.get(&timeframe).map(Vec::as_slice),
            SymbolEntry::Flat(list) if list.is_empty() => None,
            SymbolEntry::Flat(_) => {
                warn!(
                    symbol = %symbol,
                    timeframe = %timeframe,
                    "Symbol is subscribed without timeframe, timeframe lookup is empty"
                );
                Some(NO_SUBSCRIBERS)
            }
        }
    }

    /// Returns the list for `symbol`/`timeframe`, creating empty levels on miss.
    pub(crate) fn timeframe_or_insert(
        &mut self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> &[Subscriber] {
        let entry = self
            .by_symbol
            .entry(symbol.clone())
            .or_insert_with(|| SymbolEntry::empty(SubscriptionMode::Nested));
        entry.reshape_if_empty(SubscriptionMode::Nested);

        match entry {
            SymbolEntry::Nested(by_timeframe) => by_timeframe.entry(timeframe).or_default().as_slice(),
            SymbolEntry::Flat(_) => {
                warn!(
                    symbol = %symbol,
                    timeframe = %timeframe,
                    "Symbol is subscribed without timeframe, timeframe lookup is empty"
                );
                NO_SUBSCRIBERS
            }
        }
    }

    /// Returns the mode of the entry for `symbol`, if one exists.
    #[must_use]
    pub fn mode(&self, symbol: &Symbol) -> Option<SubscriptionMode> {
        self.by_symbol.get(symbol).map(SymbolEntry::mode)
    }

    /// Returns true if the tree has an entry (possibly empty) for `symbol`.
    #[must_use]
    pub fn contains_symbol(&self, symbol: &Symbol) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    /// Returns all symbol keys, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.by_symbol.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Returns the number of symbol entries, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    /// Returns true if the tree has no symbol entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    /// Returns the total number of subscriptions across all entries.
    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.by_symbol.values().map(SymbolEntry::len).sum()
    }
}
