//! # pulse-settings
//!
//! Configuration management with layered sources for the Pulse monitor.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`PulseSettings::default()`]
//! 2. **User file** — `~/.pulse/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `PULSE_*` overrides (highest priority)
//!
//! The global singleton is reloadable: [`reload_settings_from_path`] swaps
//! the cached value so all subsequent [`get_settings`] calls return fresh
//! data.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::path::Path;
use std::sync::{Arc, RwLock};

/// Global settings singleton.
///
/// `RwLock<Option<Arc<PulseSettings>>>` rather than `OnceLock` so the
/// cached value can be swapped on reload. Reads are cheap (shared lock +
/// `Arc::clone`); writes only happen on reload.
static SETTINGS: RwLock<Option<Arc<PulseSettings>>> = RwLock::new(None);

/// Get the global settings instance.
///
/// On first call, loads from `~/.pulse/settings.json` with env overrides;
/// on failure, falls back to compiled defaults. Returns an `Arc` so callers
/// hold a consistent snapshot even across a concurrent reload.
pub fn get_settings() -> Arc<PulseSettings> {
    {
        let guard = SETTINGS.read().expect("settings lock poisoned");
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    // Double-check after acquiring the write lock
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            PulseSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Initialize the global settings with a specific value.
///
/// Replaces any previously cached settings. Used by tests and by server
/// startup when the settings path is known.
pub fn init_settings(settings: PulseSettings) {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(Arc::new(settings));
}

/// Reload settings from a specific file path and swap the global cache.
pub fn reload_settings_from_path(path: &Path) {
    let new = Arc::new(match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to reload settings, falling back to defaults");
            PulseSettings::default()
        }
    });
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(new);
    tracing::info!(?path, "settings reloaded from disk");
}

/// Reset the global settings cache (test-only).
#[cfg(test)]
pub(crate) fn reset_settings() {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = None;
}
