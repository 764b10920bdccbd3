//! # pulse-tracker
//!
//! Probe sessions and their registry.
//!
//! [`registry::TrackerRegistry`] owns one session per tracked contact.
//! Each session is an independent probe loop ([`probe`]) that samples the
//! contact's devices on a fixed interval, classifies the samples into one
//! contact-level state ([`classify`]), persists a metric, and broadcasts a
//! live update. Sessions share nothing but the protocol client, the store,
//! and the event hub.

#![deny(unsafe_code)]

pub mod classify;
pub mod errors;
mod probe;
pub mod registry;

pub use classify::{Classified, DeviceReducer, MostRecentWins};
pub use errors::TrackerError;
pub use registry::{TrackerHandle, TrackerRegistry};
