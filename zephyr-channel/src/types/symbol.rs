//! Symbol type for subscription keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChannelError;

/// Reserved symbol value meaning "no specific symbol".
pub const WILDCARD: &str = "*";

/// Trading pair identifier used as the primary subscription key.
///
/// Symbols are typically in the format "BTC-USDT", "BTCUSDT" or "BTC/USDT".
/// The reserved [`WILDCARD`] value is only produced by [`Symbol::wildcard`]
/// or by parsing the literal `"*"`.
///
/// # Examples
///
/// ```
/// use zephyr_channel::types::Symbol;
///
/// let symbol = Symbol::new("BTC-USDT").unwrap();
/// assert_eq!(symbol.as_str(), "BTC-USDT");
/// assert!(!symbol.is_wildcard());
/// assert!(Symbol::wildcard().is_wildcard());
/// assert!(Symbol::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new `Symbol` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::InvalidSymbol` if the string is empty or contains
    /// characters other than alphanumerics, `-`, `_`, `/` and `.`.
    pub fn new(value: impl Into<String>) -> Result<Self, ChannelError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ChannelError::invalid_symbol(s, "symbol is empty"));
        }
        if s == WILDCARD {
            return Ok(Self(s));
        }
        if !s.chars().all(Self::is_symbol_char) {
            return Err(ChannelError::invalid_symbol(
                s,
                "only alphanumerics, '-', '_', '/' and '.' are allowed",
            ));
        }
        Ok(Self(s))
    }

    /// Creates a new `Symbol` without validation.
    ///
    /// The caller must ensure the value is a valid symbol format.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the wildcard symbol.
    #[must_use]
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    /// Resolves an optional symbol, defaulting to the wildcard.
    #[must_use]
    pub fn or_wildcard(symbol: Option<&Self>) -> Self {
        symbol.cloned().unwrap_or_else(Self::wildcard)
    }

    /// Returns true if this is the wildcard sentinel.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    const fn is_symbol_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.')
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_new_valid() {
        for raw in ["BTC-USDT", "BTCUSDT", "BTC/USDT", "ETH_PERP", "BTC-USD.P"] {
            let symbol = Symbol::new(raw).unwrap();
            assert_eq!(symbol.as_str(), raw);
        }
    }

    #[test]
    fn test_symbol_new_invalid() {
        assert!(matches!(
            Symbol::new(""),
            Err(ChannelError::InvalidSymbol { .. })
        ));
        assert!(Symbol::new("BTC USDT").is_err());
        assert!(Symbol::new("BTC*").is_err());
    }

    #[test]
    fn test_wildcard() {
        let wildcard = Symbol::wildcard();
        assert!(wildcard.is_wildcard());
        assert_eq!(wildcard.as_str(), WILDCARD);
        assert_eq!(Symbol::new("*").unwrap(), wildcard);
    }

    #[test]
    fn test_or_wildcard() {
        let btc = Symbol::new("BTC-USDT").unwrap();
        assert_eq!(Symbol::or_wildcard(Some(&btc)), btc);
        assert!(Symbol::or_wildcard(None).is_wildcard());
    }

    #[test]
    fn test_serde_validates() {
        let symbol: Symbol = serde_json::from_str("\"ETH-USDT\"").unwrap();
        assert_eq!(symbol.as_str(), "ETH-USDT");
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"ETH-USDT\"");
        assert!(serde_json::from_str::<Symbol>("\"bad symbol\"").is_err());
    }
}
