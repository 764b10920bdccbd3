//! The per-contact probe loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use pulse_core::events::{DeviceSnapshot, PulseEvent};
use pulse_core::hub::EventHub;
use pulse_core::types::Metric;
use pulse_protocol::ProtocolClient;
use pulse_store::MetricStore;

use crate::classify::DeviceReducer;
use crate::registry::TrackerHandle;

/// One running probe session.
///
/// Every tick follows the same fixed pipeline regardless of outcome:
/// probe, classify, persist, broadcast. A failed probe classifies as
/// Offline instead of skipping the tick, and a failed persist is logged
/// and the broadcast still goes out — observers always see the tick.
pub(crate) struct ProbeTask {
    pub(crate) handle: Arc<TrackerHandle>,
    pub(crate) client: Arc<dyn ProtocolClient>,
    pub(crate) store: Arc<MetricStore>,
    pub(crate) hub: Arc<EventHub>,
    pub(crate) reducer: Arc<dyn DeviceReducer>,
    pub(crate) interval: Duration,
}

impl ProbeTask {
    pub(crate) async fn run(self) {
        let address = self.handle.address().clone();
        let cancel = self.handle.cancel_token();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            counter!("probe_ticks_total").increment(1);
            let samples = match self.client.probe(&address).await {
                Ok(samples) => samples,
                Err(e) => {
                    counter!("probe_failures_total").increment(1);
                    debug!(contact = %address, error = %e, "probe failed, classifying offline");
                    Vec::new()
                }
            };

            // A removal that raced the probe wins: discard the in-flight
            // result rather than emitting for a dead session.
            if cancel.is_cancelled() {
                break;
            }

            let classified = self.reducer.reduce(&samples);
            self.handle.set_state(classified.state.into());

            let metric = Metric {
                contact: address.clone(),
                timestamp: Utc::now(),
                rtt: classified.rtt,
                state: classified.state,
            };
            if let Err(e) = self.store.append(&metric) {
                warn!(contact = %address, error = %e, "metric append failed, tick broadcast anyway");
            }

            let devices = samples
                .iter()
                .map(|s| DeviceSnapshot {
                    address: s.device.clone(),
                    state: s.raw_state,
                    rtt: s.rtt_millis,
                })
                .collect();
            let _ = self.hub.publish(PulseEvent::TrackerUpdate {
                address: address.clone(),
                state: self.handle.state(),
                rtt: classified.rtt,
                devices,
            });
        }
        debug!(contact = %address, "probe session stopped");
    }
}
