//! One registered WebSocket client.

use std::sync::atomic::{AtomicU64, Ordering};

use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound queue capacity per client.
pub const CLIENT_QUEUE_CAPACITY: usize = 64;

/// A connected client as the broadcaster sees it.
///
/// Payloads are shared `Arc<String>`s: serialized once per event, cloned
/// per client by pointer.
pub struct ClientConnection {
    id: String,
    tx: mpsc::Sender<Arc<String>>,
    drops: AtomicU64,
}

impl ClientConnection {
    /// Wrap a client's outbound queue.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            drops: AtomicU64::new(0),
        }
    }

    /// Unique connection id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a payload without blocking. Returns `false` on a full or
    /// closed queue; full queues also bump the drop count.
    pub fn try_send(&self, payload: Arc<String>) -> bool {
        match self.tx.try_send(payload) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let _ = self.drops.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Messages dropped on this client's queue so far.
    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Whether the client hung up.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Mint a fresh connection id.
pub fn new_connection_id() -> String {
    format!("conn_{}", Uuid::now_v7())
}
