//! # pulse-server
//!
//! The outward surface of the Pulse presence monitor.
//!
//! - [`routes`] — REST endpoints for history and window analysis
//! - [`websocket`] — live event fan-out and the add/remove command channel
//! - [`state::AppState`] — shared handles threaded through every handler
//! - [`metrics`] — Prometheus exporter setup and metric names

#![deny(unsafe_code)]

pub mod errors;
pub mod metrics;
pub mod routes;
pub mod state;
#[cfg(test)]
pub(crate) mod testutil;
pub mod websocket;

pub use errors::ServerError;
pub use routes::router;
pub use state::AppState;
