//! Settings loading: file read, deep merge, env overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::Result;
use crate::types::PulseSettings;

/// Default settings file path: `~/.pulse/settings.json`.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pulse")
        .join("settings.json")
}

/// Deep-merge `overlay` into `base`: objects merge recursively, everything
/// else is replaced by the overlay value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from the default path with env overrides.
pub fn load_settings() -> Result<PulseSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path.
///
/// Layers, in priority order: compiled defaults, the JSON file (deep-merged
/// over defaults, missing file is fine), then `PULSE_*` env overrides.
pub fn load_settings_from_path(path: &Path) -> Result<PulseSettings> {
    let defaults = serde_json::to_value(PulseSettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let file_value: Value = serde_json::from_str(&raw)?;
        deep_merge(defaults, file_value)
    } else {
        defaults
    };

    let mut settings: PulseSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Apply `PULSE_*` environment overrides (highest priority).
fn apply_env_overrides(settings: &mut PulseSettings) {
    if let Some(port) = env_parse::<u16>("PULSE_HTTP_PORT") {
        settings.server.http_port = port;
    }
    if let Ok(bind) = std::env::var("PULSE_BIND") {
        settings.server.bind = bind;
    }
    if let Ok(path) = std::env::var("PULSE_DB_PATH") {
        settings.store.db_path = path;
    }
    if let Some(ms) = env_parse::<u64>("PULSE_PROBE_INTERVAL_MS") {
        settings.probe.interval_ms = ms;
    }
    if let Some(ms) = env_parse::<u64>("PULSE_GAP_THRESHOLD_MS") {
        settings.analytics.gap_threshold_ms = ms;
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, raw, "ignoring unparseable env override");
            None
        }
    }
}
