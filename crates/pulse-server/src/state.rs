//! Shared state threaded through every handler.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use pulse_core::hub::EventHub;
use pulse_protocol::SessionSupervisor;
use pulse_store::MetricStore;
use pulse_tracker::TrackerRegistry;

use crate::websocket::broadcast::BroadcastManager;

/// Handles shared by REST and WebSocket handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Active probe sessions.
    pub registry: Arc<TrackerRegistry>,
    /// Durable metric storage.
    pub store: Arc<MetricStore>,
    /// Live event fan-out.
    pub hub: Arc<EventHub>,
    /// The shared protocol session.
    pub supervisor: Arc<SessionSupervisor>,
    /// Connected WebSocket clients.
    pub broadcast: Arc<BroadcastManager>,
    /// Gap threshold handed to the analytics engine.
    pub gap_threshold: Duration,
    /// Window applied when a query names no range.
    pub default_range: Duration,
    /// Prometheus render handle, absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}
