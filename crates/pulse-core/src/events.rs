//! Live events broadcast to dashboard observers.
//!
//! [`PulseEvent`] is the single event family fanned out over the real-time
//! channel. Events are transient (never persisted — the durable record is
//! the [`Metric`](crate::types::Metric) stream) and carry the exact wire
//! tags the dashboard consumes.

use serde::{Deserialize, Serialize};

use crate::types::{ContactAddress, DeviceAddress, RawDeviceState, TrackerState};

/// Per-device snapshot embedded in a `tracker-update` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// The responding device.
    pub address: DeviceAddress,
    /// Raw state the device reported this tick.
    pub state: RawDeviceState,
    /// Probe round-trip time in milliseconds.
    pub rtt: u64,
}

/// Events published to all connected observers.
///
/// Delivery is best-effort and ordered per publisher, not globally ordered
/// across contacts. Late-joining subscribers receive a `tracked-contacts`
/// snapshot on subscription, then only live events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PulseEvent {
    /// Pairing challenge payload from the messaging network.
    #[serde(rename = "qr")]
    Qr {
        /// Opaque challenge payload to render for the operator.
        payload: String,
    },

    /// The underlying protocol session is established.
    #[serde(rename = "connection-open")]
    ConnectionOpen,

    /// The underlying protocol session was lost.
    #[serde(rename = "connection-closed")]
    ConnectionClosed {
        /// Human-readable close reason.
        reason: String,
    },

    /// Snapshot of currently tracked contacts, sent once per subscription.
    #[serde(rename = "tracked-contacts")]
    TrackedContacts {
        /// Addresses currently tracked.
        contacts: Vec<ContactAddress>,
    },

    /// A contact was added to the registry.
    #[serde(rename = "contact-added")]
    ContactAdded {
        /// Canonical address.
        address: ContactAddress,
        /// Label to display until a name arrives (usually the raw number).
        #[serde(rename = "displayLabel")]
        display_label: String,
    },

    /// A contact was removed from the registry.
    #[serde(rename = "contact-removed")]
    ContactRemoved {
        /// Canonical address.
        address: ContactAddress,
    },

    /// Display name resolved for a tracked contact.
    #[serde(rename = "contact-name")]
    ContactName {
        /// Canonical address.
        address: ContactAddress,
        /// Resolved name.
        name: String,
    },

    /// One classified probe tick. Emitted every tick, state change or not,
    /// so dashboards can show live RTT while the state is stable.
    #[serde(rename = "tracker-update")]
    TrackerUpdate {
        /// Canonical address.
        address: ContactAddress,
        /// Contact-level session state after this tick.
        state: TrackerState,
        /// RTT of the winning device, milliseconds.
        rtt: u64,
        /// All devices observed this tick.
        devices: Vec<DeviceSnapshot>,
    },

    /// Non-fatal failure surfaced to observers (resolution failure,
    /// duplicate add, and similar).
    #[serde(rename = "error")]
    TrackerError {
        /// Address the failure concerns.
        address: ContactAddress,
        /// Human-readable message.
        message: String,
    },
}

impl PulseEvent {
    /// Wire tag of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Qr { .. } => "qr",
            Self::ConnectionOpen => "connection-open",
            Self::ConnectionClosed { .. } => "connection-closed",
            Self::TrackedContacts { .. } => "tracked-contacts",
            Self::ContactAdded { .. } => "contact-added",
            Self::ContactRemoved { .. } => "contact-removed",
            Self::ContactName { .. } => "contact-name",
            Self::TrackerUpdate { .. } => "tracker-update",
            Self::TrackerError { .. } => "error",
        }
    }
}
