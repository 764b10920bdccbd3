//! Fan-out of serialized events to every connected WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::{counter, gauge};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::metrics::{WS_BROADCAST_DROPS_TOTAL, WS_CLIENTS_EVICTED_TOTAL, WS_CONNECTIONS};
use crate::websocket::connection::ClientConnection;

/// A client that has dropped this many messages in total gets evicted.
const MAX_TOTAL_DROPS: u64 = 100;

/// Registry of connected clients and the broadcast path over them.
///
/// `broadcast_all` never blocks: a slow client drops messages rather than
/// stalling the rest, and a persistently slow one is evicted so it cannot
/// accumulate unbounded lag.
pub struct BroadcastManager {
    connections: RwLock<HashMap<String, ClientConnection>>,
    count: AtomicUsize,
}

impl BroadcastManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            count: AtomicUsize::new(0),
        }
    }

    /// Register a connected client.
    pub fn register(&self, connection: ClientConnection) {
        let id = connection.id().to_string();
        let count = {
            let mut connections = self.connections.write();
            let _ = connections.insert(id.clone(), connection);
            connections.len()
        };
        self.count.store(count, Ordering::Relaxed);
        gauge!(WS_CONNECTIONS).set(count as f64);
        debug!(connection = %id, count, "websocket client registered");
    }

    /// Drop a client, normally when its socket closes.
    pub fn unregister(&self, id: &str) {
        let count = {
            let mut connections = self.connections.write();
            let _ = connections.remove(id);
            connections.len()
        };
        self.count.store(count, Ordering::Relaxed);
        gauge!(WS_CONNECTIONS).set(count as f64);
        debug!(connection = %id, count, "websocket client unregistered");
    }

    /// Number of connected clients.
    pub fn connection_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Send one serialized payload to every client.
    ///
    /// The payload is serialized once by the caller and shared by pointer.
    /// Clients whose queues are full or closed past tolerance are evicted
    /// after the pass.
    pub fn broadcast_all(&self, payload: &Arc<String>) {
        let mut evict: Vec<String> = Vec::new();
        {
            let connections = self.connections.read();
            for connection in connections.values() {
                if !connection.try_send(Arc::clone(payload)) {
                    counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                    if connection.is_closed() || connection.drop_count() >= MAX_TOTAL_DROPS {
                        evict.push(connection.id().to_string());
                    }
                }
            }
        }
        for id in evict {
            warn!(connection = %id, "evicting slow websocket client");
            counter!(WS_CLIENTS_EVICTED_TOTAL).increment(1);
            self.unregister(&id);
        }
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}
