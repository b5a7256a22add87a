//! Publish-round throttling shared by every symbol of a channel.
//!
//! The gate counts publish attempts. Once `threshold` attempts have been
//! made, the gate opens and consumers with a non-zero `filter_size` are
//! included in the round. The counter is only reset by [`ThrottleGate::has_sent`]
//! after a round in which the gate was observed open.
//!
//! ```text
//! threshold = 3
//!
//! will_send  observe   has_sent   pending  open
//! ---------  --------  ---------  -------  -----
//!     1      closed    no-op         1       -
//!     2      closed    no-op         2       -
//!     3      open      reset         0     yes
//! ```

use serde::{Deserialize, Serialize};

/// Snapshot of a gate's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    /// Attempts needed before throttled consumers are included.
    pub threshold: u32,
    /// Attempts since the last reset.
    pub pending_attempts: u32,
    /// True if the next `has_sent` resets the counter.
    pub reset_pending: bool,
}

impl GateState {
    /// Returns true if throttled consumers would be included right now.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.pending_attempts >= self.threshold
    }
}

/// Counter and flag deciding whether throttled consumers join a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleGate {
    threshold: u32,
    pending_attempts: u32,
    reset_pending: bool,
}

impl ThrottleGate {
    /// Threshold used when none is configured.
    pub const DEFAULT_THRESHOLD: u32 = 1;

    /// Creates a closed gate.
    ///
    /// A threshold of `0` keeps the gate permanently open.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            threshold,
            pending_attempts: 0,
            reset_pending: false,
        }
    }

    /// Returns the threshold.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns true if the attempt count has reached the threshold.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.pending_attempts >= self.threshold
    }

    /// Records a publish attempt.
    pub fn will_send(&mut self) {
        self.pending_attempts = self.pending_attempts.saturating_add(1);
    }

    /// Evaluates the gate for a consumer lookup.
    ///
    /// When open, the reset is deferred to the next [`has_sent`](Self::has_sent).
    pub fn observe(&mut self) -> bool {
        let open = self.is_open();
        if open {
            self.reset_pending = true;
        }
        open
    }

    /// Closes a dispatch round.
    ///
    /// Returns `true` if the counter was reset.
    pub fn has_sent(&mut self) -> bool {
        if !self.reset_pending {
            return false;
        }
        self.pending_attempts = 0;
        self.reset_pending = false;
        true
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub const fn state(&self) -> GateState {
        GateState {
            threshold: self.threshold,
            pending_attempts: self.pending_attempts,
            reset_pending: self.reset_pending,
        }
    }
}

impl Default for ThrottleGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}
