//! Pump hub events into the WebSocket broadcast path.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use pulse_core::hub::EventHub;

use crate::websocket::broadcast::BroadcastManager;

/// Forward every hub event to every connected client until cancelled.
///
/// Serializes each event exactly once; the manager fans the shared string
/// out by pointer. A lag on the hub side is logged and skipped — dashboard
/// observers tolerate holes, the durable record lives in the store.
pub async fn run_event_bridge(
    hub: Arc<EventHub>,
    manager: Arc<BroadcastManager>,
    cancel: CancellationToken,
) {
    let mut rx = hub.subscribe();
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = rx.recv() => event,
        };
        match event {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => manager.broadcast_all(&Arc::new(json)),
                Err(e) => warn!(error = %e, "failed to serialize event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event bridge lagged behind the hub");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("event bridge stopped");
}
