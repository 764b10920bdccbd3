//! Settings types with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PulseSettings {
    /// Settings schema version.
    pub version: String,
    /// HTTP/WebSocket server settings.
    pub server: ServerSettings,
    /// Probe loop settings.
    pub probe: ProbeSettings,
    /// Analytics window settings.
    pub analytics: AnalyticsSettings,
    /// Metric store settings.
    pub store: StoreSettings,
    /// Protocol session supervision settings.
    pub session: SessionSettings,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            probe: ProbeSettings::default(),
            analytics: AnalyticsSettings::default(),
            store: StoreSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

/// HTTP/WebSocket server settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub bind: String,
    /// HTTP port (REST + WebSocket upgrade).
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            http_port: 3001,
        }
    }
}

/// Probe loop settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeSettings {
    /// Fixed sampling cadence in milliseconds.
    pub interval_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self { interval_ms: 10_000 }
    }
}

/// Analytics window settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSettings {
    /// Inter-sample gaps at or above this are treated as "monitoring was
    /// not running" and contribute zero duration.
    pub gap_threshold_ms: u64,
    /// Default trailing query window in hours.
    pub default_range_hours: u64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            gap_threshold_ms: 60_000,
            default_range_hours: 24,
        }
    }
}

/// Metric store settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// SQLite database path. `:memory:` for an in-memory store.
    pub db_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: "pulse.db".to_string(),
        }
    }
}

/// Protocol session supervision settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Initial reconnect delay in milliseconds.
    pub reconnect_base_ms: u64,
    /// Reconnect delay ceiling in milliseconds.
    pub reconnect_max_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reconnect_base_ms: 1_000,
            reconnect_max_ms: 60_000,
        }
    }
}
