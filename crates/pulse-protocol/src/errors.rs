//! Protocol errors.

use thiserror::Error;

/// Errors raised by the protocol client and session supervision.
///
/// Probe-path instances (`Transport`, `Timeout`, `SessionClosed`) are
/// recovered locally by the probe loop — the tick classifies as Offline
/// instead of propagating.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The underlying transport failed mid-exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// The probe did not complete within the deadline.
    #[error("probe timed out after {0}ms")]
    Timeout(u64),

    /// The shared session is not currently established.
    #[error("session closed: {0}")]
    SessionClosed(String),

    /// Address resolution failed (network error, not "does not exist").
    #[error("address resolution failed: {0}")]
    Resolution(String),
}
