//! Broadcast-based fan-out hub for [`PulseEvent`] dispatch.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::events::PulseEvent;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 1024;

/// Publish/subscribe fan-out of live events to all observers.
///
/// Non-blocking: `publish` never awaits. Delivery is best-effort and
/// ordered per publisher; slow receivers lag out rather than blocking
/// the publisher.
pub struct EventHub {
    tx: broadcast::Sender<PulseEvent>,
    publish_count: AtomicU64,
}

impl EventHub {
    /// Create a hub with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a hub with a custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            publish_count: AtomicU64::new(0),
        }
    }

    /// Publish an event to all subscribers. Non-blocking.
    ///
    /// Returns the number of receivers the event reached (0 when nobody
    /// is listening — publishing into the void is not an error).
    pub fn publish(&self, event: PulseEvent) -> usize {
        let _ = self.publish_count.fetch_add(1, Ordering::Relaxed);
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe. The receiver sees every event published after this call
    /// and nothing from before it.
    pub fn subscribe(&self) -> broadcast::Receiver<PulseEvent> {
        self.tx.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total number of events published.
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
