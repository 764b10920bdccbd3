//! Tracker errors.

use thiserror::Error;

use pulse_core::types::ContactAddress;
use pulse_protocol::ProtocolError;

/// Errors raised by registry operations.
///
/// All of these are per-request failures surfaced to the caller (and, over
/// the WebSocket, to the requesting client only); none of them affect
/// other running sessions.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The contact already has a running session.
    #[error("already tracking {0}")]
    AlreadyTracked(ContactAddress),

    /// No session exists for the contact.
    #[error("not tracking {0}")]
    NotTracked(ContactAddress),

    /// The number resolved cleanly but is not registered on the network.
    #[error("{0} is not on the network")]
    NotOnNetwork(String),

    /// The protocol layer failed before a session could be decided.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
