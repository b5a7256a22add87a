//! Consumer trait for channel subscribers.
//!
//! Consumers are supplied by the surrounding system; channels only keep
//! `Arc` references to them and hand them back to producers on each publish.

use async_trait::async_trait;
use std::sync::Arc;

/// A sink registered on a [`Channel`](crate::Channel).
///
/// # Throttling
///
/// A `filter_size` of `0` means the consumer is returned on every publish.
/// Any other value opts the consumer into throttled delivery: it is only
/// returned on rounds where the channel's gate is open. The value is read
/// once when the consumer is subscribed and must not change afterwards.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use zephyr_channel::Consumer;
///
/// struct TickerLogger;
///
/// #[async_trait]
/// impl Consumer for TickerLogger {
///     fn name(&self) -> &str {
///         "ticker_logger"
///     }
///
///     async fn run(&self) {
///         // spawn the worker that drains this consumer's queue
///     }
/// }
/// ```
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Name used in log records.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Throttling opt-in, `0` for always-on delivery.
    fn filter_size(&self) -> u32 {
        0
    }

    /// Activation hook, awaited exactly once after a successful subscribe.
    async fn run(&self);
}

/// Returns true if both handles point at the same consumer.
#[must_use]
pub fn same_consumer(a: &Arc<dyn Consumer>, b: &Arc<dyn Consumer>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Consumer that counts activations.
    #[derive(Debug)]
    pub(crate) struct RecordingConsumer {
        name: String,
        filter_size: u32,
        runs: AtomicUsize,
    }

    impl RecordingConsumer {
        pub(crate) fn new(name: &str, filter_size: u32) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                filter_size,
                runs: AtomicUsize::new(0),
            })
        }

        pub(crate) fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Consumer for RecordingConsumer {
        fn name(&self) -> &str {
            &self.name
        }

        fn filter_size(&self) -> u32 {
            self.filter_size
        }

        async fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Returns the names of the consumers, in order.
    pub(crate) fn names(consumers: &[Arc<dyn Consumer>]) -> Vec<String> {
        consumers.iter().map(|c| c.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingConsumer;
    use super::*;

    struct Defaults;

    #[async_trait]
    impl Consumer for Defaults {
        async fn run(&self) {}
    }

    #[test]
    fn test_default_filter_size_is_always_on() {
        assert_eq!(Defaults.filter_size(), 0);
        assert!(Defaults.name().ends_with("Defaults"));
    }

    #[test]
    fn test_same_consumer() {
        let a: Arc<dyn Consumer> = RecordingConsumer::new("a", 0);
        let b: Arc<dyn Consumer> = RecordingConsumer::new("a", 0);
        let a2 = Arc::clone(&a);

        assert!(same_consumer(&a, &a2));
        assert!(!same_consumer(&a, &b));
    }

    #[tokio::test]
    async fn test_recording_consumer_counts_runs() {
        let consumer = RecordingConsumer::new("recorder", 3);
        consumer.run().await;
        consumer.run().await;
        assert_eq!(consumer.runs(), 2);
        assert_eq!(consumer.filter_size(), 3);
    }
}
