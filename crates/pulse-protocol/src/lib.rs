//! # pulse-protocol
//!
//! The seam between the Pulse core and the remote messaging network.
//!
//! - [`client::ProtocolClient`] — the narrow trait every probe talks
//!   through: `connect`, `resolve`, `probe`, lifecycle stream.
//! - [`supervisor::SessionSupervisor`] — owns the single shared session,
//!   reconnects with backoff, forwards lifecycle events into the hub.
//! - [`sim::SimulatedClient`] — deterministic stand-in network used by the
//!   binary and integration tests.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod sim;
pub mod supervisor;

pub use client::{LifecycleEvent, ProtocolClient, Resolution};
pub use errors::ProtocolError;
pub use supervisor::{BackoffConfig, SessionSupervisor};
