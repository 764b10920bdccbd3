//! Prometheus exporter setup and exported metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Number of currently running probe sessions.
pub const TRACKERS_ACTIVE: &str = "trackers_active";
/// Total metric rows appended to the store.
pub const METRICS_APPENDED_TOTAL: &str = "metrics_appended_total";
/// Probe ticks executed across all sessions.
pub const PROBE_TICKS_TOTAL: &str = "probe_ticks_total";
/// Probe ticks that failed at the protocol layer.
pub const PROBE_FAILURES_TOTAL: &str = "probe_failures_total";
/// Currently connected WebSocket clients.
pub const WS_CONNECTIONS: &str = "ws_connections";
/// Messages dropped on saturated WebSocket client queues.
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// Clients evicted for persistent slowness.
pub const WS_CLIENTS_EVICTED_TOTAL: &str = "ws_clients_evicted_total";

/// Install the global Prometheus recorder and return its render handle.
///
/// Call once at startup, before any counter is touched.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
