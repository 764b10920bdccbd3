//! The narrow seam between the core and the messaging network.

use async_trait::async_trait;
use tokio::sync::broadcast;

use pulse_core::types::{ContactAddress, DeviceSample};

use crate::errors::ProtocolError;

/// Outcome of resolving a raw number against the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Whether the number exists on the network.
    pub exists: bool,
    /// Canonical address (meaningful only when `exists`).
    pub address: ContactAddress,
    /// Profile name pushed by the network, when it shares one.
    pub display_name: Option<String>,
}

/// Lifecycle signals of the single shared protocol session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Session established.
    SessionOpened,
    /// Session lost.
    SessionClosed {
        /// Close reason.
        reason: String,
    },
    /// The network demands operator pairing.
    PairingChallenge {
        /// Opaque challenge payload.
        payload: String,
    },
}

/// Client for the remote messaging network.
///
/// One owned session shared by every probe; injected at construction so
/// tests substitute a fake without touching probe logic. Implementations
/// must be cheap to call concurrently — all probes issue requests through
/// the same instance.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Establish the session. Resolves once the session is open.
    async fn connect(&self) -> Result<(), ProtocolError>;

    /// Resolve a raw (digits-only) number to a canonical address.
    async fn resolve(&self, raw_number: &str) -> Result<Resolution, ProtocolError>;

    /// Probe the presence of every device of a contact.
    ///
    /// Returns zero or more samples; an empty vector means no device
    /// responded this tick.
    async fn probe(&self, address: &ContactAddress) -> Result<Vec<DeviceSample>, ProtocolError>;

    /// Subscribe to session lifecycle events.
    fn lifecycle(&self) -> broadcast::Receiver<LifecycleEvent>;
}
