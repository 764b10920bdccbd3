//! The tracker registry — one probe session per tracked contact.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use pulse_core::events::PulseEvent;
use pulse_core::hub::EventHub;
use pulse_core::types::{Contact, ContactAddress, TrackerState};
use pulse_protocol::ProtocolClient;
use pulse_store::MetricStore;

use crate::classify::{DeviceReducer, MostRecentWins};
use crate::errors::TrackerError;
use crate::probe::ProbeTask;

const TRACKERS_ACTIVE_GAUGE: &str = "trackers_active";

/// Shared state of one probe session.
///
/// The registry holds one handle per tracked contact; the probe task holds
/// a clone and writes the state after each tick.
pub struct TrackerHandle {
    address: ContactAddress,
    display_name: Mutex<Option<String>>,
    state: Mutex<TrackerState>,
    cancel: CancellationToken,
}

impl TrackerHandle {
    fn new(address: ContactAddress, display_name: Option<String>) -> Self {
        Self {
            address,
            display_name: Mutex::new(display_name),
            state: Mutex::new(TrackerState::Calibrating),
            cancel: CancellationToken::new(),
        }
    }

    /// Canonical address of the tracked contact.
    pub fn address(&self) -> &ContactAddress {
        &self.address
    }

    /// Resolved display name, when the network shared one.
    pub fn display_name(&self) -> Option<String> {
        self.display_name.lock().clone()
    }

    /// Current session state. `Calibrating` until the first tick classifies.
    pub fn state(&self) -> TrackerState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: TrackerState) {
        *self.state.lock() = state;
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Registry of active probe sessions, keyed by canonical address.
///
/// Sessions are independent: add and remove never touch other sessions,
/// and a failing session cannot take down its neighbors. The registry
/// lock guards only the map — never held across an await.
pub struct TrackerRegistry {
    trackers: Mutex<HashMap<ContactAddress, Arc<TrackerHandle>>>,
    client: Arc<dyn ProtocolClient>,
    store: Arc<MetricStore>,
    hub: Arc<EventHub>,
    reducer: Arc<dyn DeviceReducer>,
    probe_interval: Duration,
}

impl TrackerRegistry {
    /// Create a registry with the default reduction strategy.
    pub fn new(
        client: Arc<dyn ProtocolClient>,
        store: Arc<MetricStore>,
        hub: Arc<EventHub>,
        probe_interval: Duration,
    ) -> Self {
        Self {
            trackers: Mutex::new(HashMap::new()),
            client,
            store,
            hub,
            reducer: Arc::new(MostRecentWins),
            probe_interval,
        }
    }

    /// Override the device reduction strategy.
    pub fn with_reducer(mut self, reducer: Arc<dyn DeviceReducer>) -> Self {
        self.reducer = reducer;
        self
    }

    /// Resolve a raw number and start a probe session for it.
    ///
    /// The number is normalized to its digits before resolution, so
    /// `+1 (555) 123-4567` and `15551234567` name the same contact.
    /// Resolution runs without the registry lock; the check-and-insert
    /// under the lock is what makes a concurrent duplicate add lose.
    #[instrument(skip(self))]
    pub async fn add(&self, raw_number: &str) -> Result<ContactAddress, TrackerError> {
        let digits: String = raw_number.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(TrackerError::NotOnNetwork(raw_number.to_string()));
        }

        let resolution = self.client.resolve(&digits).await?;
        if !resolution.exists {
            return Err(TrackerError::NotOnNetwork(digits));
        }
        let address = resolution.address;

        let handle = {
            let mut trackers = self.trackers.lock();
            if trackers.contains_key(&address) {
                return Err(TrackerError::AlreadyTracked(address));
            }
            let handle = Arc::new(TrackerHandle::new(
                address.clone(),
                resolution.display_name.clone(),
            ));
            let _ = trackers.insert(address.clone(), Arc::clone(&handle));
            gauge!(TRACKERS_ACTIVE_GAUGE).set(trackers.len() as f64);
            handle
        };

        let task = ProbeTask {
            handle,
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            hub: Arc::clone(&self.hub),
            reducer: Arc::clone(&self.reducer),
            interval: self.probe_interval,
        };
        let _ = tokio::spawn(task.run());

        info!(contact = %address, "tracker started");
        let _ = self.hub.publish(PulseEvent::ContactAdded {
            address: address.clone(),
            display_label: digits,
        });
        if let Some(name) = resolution.display_name {
            let _ = self.hub.publish(PulseEvent::ContactName {
                address: address.clone(),
                name,
            });
        }
        Ok(address)
    }

    /// Stop and drop the session for a contact.
    #[instrument(skip(self), fields(contact = %address))]
    pub fn remove(&self, address: &ContactAddress) -> Result<(), TrackerError> {
        let handle = {
            let mut trackers = self.trackers.lock();
            let handle = trackers.remove(address);
            gauge!(TRACKERS_ACTIVE_GAUGE).set(trackers.len() as f64);
            handle
        };
        let Some(handle) = handle else {
            return Err(TrackerError::NotTracked(address.clone()));
        };
        handle.cancel.cancel();
        info!(contact = %address, "tracker stopped");
        let _ = self.hub.publish(PulseEvent::ContactRemoved {
            address: address.clone(),
        });
        Ok(())
    }

    /// Whether a session exists for the contact.
    pub fn is_tracked(&self, address: &ContactAddress) -> bool {
        self.trackers.lock().contains_key(address)
    }

    /// Current session state for a contact, if tracked.
    pub fn state_of(&self, address: &ContactAddress) -> Option<TrackerState> {
        self.trackers.lock().get(address).map(|h| h.state())
    }

    /// All tracked contacts, sorted by address.
    pub fn list(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self
            .trackers
            .lock()
            .values()
            .map(|handle| Contact {
                address: handle.address().clone(),
                display_name: handle.display_name(),
            })
            .collect();
        contacts.sort_by(|a, b| a.address.cmp(&b.address));
        contacts
    }

    /// Addresses of all tracked contacts, sorted.
    pub fn snapshot(&self) -> Vec<ContactAddress> {
        let mut addresses: Vec<ContactAddress> = self.trackers.lock().keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Cancel every session and clear the registry.
    pub fn shutdown(&self) {
        let drained: Vec<Arc<TrackerHandle>> = {
            let mut trackers = self.trackers.lock();
            let drained = trackers.drain().map(|(_, handle)| handle).collect();
            gauge!(TRACKERS_ACTIVE_GAUGE).set(0.0);
            drained
        };
        for handle in &drained {
            handle.cancel.cancel();
        }
        info!(sessions = drained.len(), "registry shut down");
    }
}
