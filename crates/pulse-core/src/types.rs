//! Contact identifiers, presence states, and the persisted metric record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical protocol address of a monitored contact.
///
/// Opaque to the core: produced by address resolution on the messaging
/// network and used as the registry and storage key. Unique per contact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactAddress(String);

impl ContactAddress {
    /// Wrap a canonical address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Address of a single device belonging to a contact.
///
/// One contact may have several concurrently active devices; classification
/// reduces their samples to one contact-level state per tick.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Wrap a device address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Canonical protocol address.
    pub address: ContactAddress,
    /// Optional human-readable name pushed by the network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Raw presence state of one device, as reported by the protocol client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawDeviceState {
    /// Device is actively connected.
    Online,
    /// Device is reachable but idle.
    Standby,
    /// Device did not respond.
    Offline,
    /// Device responded but has not settled into a classifiable state yet.
    Calibrating,
}

/// Classified contact-level activity state. This is what gets persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityState {
    /// Contact has at least one actively connected device.
    Online,
    /// Contact is reachable but idle.
    Standby,
    /// No device responded.
    Offline,
}

impl ActivityState {
    /// SQL TEXT encoding.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Standby => "Standby",
            Self::Offline => "Offline",
        }
    }

    /// Decode from the SQL TEXT encoding.
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "Online" => Some(Self::Online),
            "Standby" => Some(Self::Standby),
            "Offline" => Some(Self::Offline),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Per-session presence state machine.
///
/// `Calibrating` is the initial state, held until the first sample is
/// classified. Every other state is reachable from every state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerState {
    /// No sample classified yet.
    Calibrating,
    /// Classified contact-level state.
    Online,
    /// Classified contact-level state.
    Standby,
    /// Classified contact-level state.
    Offline,
}

impl From<ActivityState> for TrackerState {
    fn from(state: ActivityState) -> Self {
        match state {
            ActivityState::Online => Self::Online,
            ActivityState::Standby => Self::Standby,
            ActivityState::Offline => Self::Offline,
        }
    }
}

/// One probe response from a single device of a contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSample {
    /// Contact this device belongs to.
    pub contact: ContactAddress,
    /// The responding device.
    pub device: DeviceAddress,
    /// Probe round-trip time in milliseconds.
    pub rtt_millis: u64,
    /// Raw reported state.
    pub raw_state: RawDeviceState,
    /// When the sample was observed.
    pub observed_at: DateTime<Utc>,
}

/// Persisted projection of one classified probe tick.
///
/// Immutable once written; append-only; ordered by timestamp per contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// Contact the sample belongs to.
    pub contact: ContactAddress,
    /// Observation time.
    pub timestamp: DateTime<Utc>,
    /// Round-trip time in milliseconds of the winning device.
    pub rtt: u64,
    /// Classified contact-level state.
    pub state: ActivityState,
}

/// Derived statistics over a window of metrics.
///
/// A pure function of the metric sequence handed to the analytics engine.
/// Never persisted; recomputed fresh per query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Total Online time in milliseconds within the window.
    #[serde(rename = "totalScreenTime")]
    pub total_active_ms: u64,
    /// Longest contiguous non-Online, gap-free duration in milliseconds.
    #[serde(rename = "longestSleep")]
    pub longest_sleep_ms: u64,
    /// Mean RTT over Online samples, milliseconds. Zero when no samples.
    #[serde(rename = "avgOnlineRtt")]
    pub avg_online_rtt: f64,
    /// Mean RTT over Standby samples, milliseconds. Zero when no samples.
    #[serde(rename = "avgStandbyRtt")]
    pub avg_standby_rtt: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_address_roundtrip() {
        let addr = ContactAddress::new("15551234567@pulse.net");
        assert_eq!(addr.as_str(), "15551234567@pulse.net");
        assert_eq!(addr.to_string(), "15551234567@pulse.net");
    }

    #[test]
    fn contact_address_serde_transparent() {
        let addr = ContactAddress::new("a@b");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"a@b\"");
        let back: ContactAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn activity_state_sql_roundtrip() {
        for state in [
            ActivityState::Online,
            ActivityState::Standby,
            ActivityState::Offline,
        ] {
            assert_eq!(ActivityState::from_sql(state.as_sql()), Some(state));
        }
        assert_eq!(ActivityState::from_sql("Calibrating"), None);
        assert_eq!(ActivityState::from_sql(""), None);
    }

    #[test]
    fn tracker_state_from_activity() {
        assert_eq!(
            TrackerState::from(ActivityState::Online),
            TrackerState::Online
        );
        assert_eq!(
            TrackerState::from(ActivityState::Offline),
            TrackerState::Offline
        );
    }

    #[test]
    fn analysis_result_wire_field_names() {
        let result = AnalysisResult {
            total_active_ms: 10_000,
            longest_sleep_ms: 0,
            avg_online_rtt: 125.0,
            avg_standby_rtt: 800.0,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalScreenTime"], 10_000);
        assert_eq!(json["longestSleep"], 0);
        assert_eq!(json["avgOnlineRtt"], 125.0);
        assert_eq!(json["avgStandbyRtt"], 800.0);
    }

    #[test]
    fn metric_serializes_camel_case() {
        let metric = Metric {
            contact: ContactAddress::new("c1"),
            timestamp: chrono::Utc::now(),
            rtt: 120,
            state: ActivityState::Online,
        };
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["contact"], "c1");
        assert_eq!(json["rtt"], 120);
        assert_eq!(json["state"], "Online");
    }
}
