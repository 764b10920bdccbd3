//! Shared fixtures for handler and route tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use pulse_core::hub::EventHub;
use pulse_core::types::{ContactAddress, DeviceAddress, DeviceSample, RawDeviceState};
use pulse_protocol::{
    BackoffConfig, LifecycleEvent, ProtocolClient, ProtocolError, Resolution, SessionSupervisor,
};
use pulse_store::{ConnectionConfig, MetricStore, new_in_memory, run_migrations};
use pulse_tracker::TrackerRegistry;

use crate::state::AppState;
use crate::websocket::broadcast::BroadcastManager;

/// Minimal network fake: numbers with at least seven digits exist, and
/// every probe answers with one Online device.
pub(crate) struct StaticClient {
    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
}

impl StaticClient {
    fn new() -> Self {
        let (lifecycle_tx, _) = broadcast::channel(16);
        Self { lifecycle_tx }
    }
}

#[async_trait]
impl ProtocolClient for StaticClient {
    async fn connect(&self) -> Result<(), ProtocolError> {
        Ok(())
    }

    async fn resolve(&self, raw_number: &str) -> Result<Resolution, ProtocolError> {
        let exists = raw_number.len() >= 7;
        Ok(Resolution {
            exists,
            address: ContactAddress::new(format!("{raw_number}@test.net")),
            display_name: None,
        })
    }

    async fn probe(&self, address: &ContactAddress) -> Result<Vec<DeviceSample>, ProtocolError> {
        Ok(vec![DeviceSample {
            contact: address.clone(),
            device: DeviceAddress::new(format!("{address}:0")),
            rtt_millis: 120,
            raw_state: RawDeviceState::Online,
            observed_at: Utc::now(),
        }])
    }

    fn lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle_tx.subscribe()
    }
}

/// A fully wired `AppState` over an in-memory store and a fake network.
pub(crate) fn test_state() -> AppState {
    let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }
    let store = Arc::new(MetricStore::new(pool));
    let hub = Arc::new(EventHub::new());
    let client: Arc<dyn ProtocolClient> = Arc::new(StaticClient::new());
    let registry = Arc::new(TrackerRegistry::new(
        Arc::clone(&client),
        Arc::clone(&store),
        Arc::clone(&hub),
        Duration::from_secs(10),
    ));
    let supervisor = Arc::new(SessionSupervisor::new(
        client,
        Arc::clone(&hub),
        BackoffConfig::default(),
    ));
    AppState {
        registry,
        store,
        hub,
        supervisor,
        broadcast: Arc::new(BroadcastManager::new()),
        gap_threshold: Duration::from_secs(60),
        default_range: Duration::from_secs(24 * 3600),
        prometheus: None,
    }
}
