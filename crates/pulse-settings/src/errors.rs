//! Settings errors.

use thiserror::Error;

/// Convenience result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors raised while loading or parsing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON.
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}
