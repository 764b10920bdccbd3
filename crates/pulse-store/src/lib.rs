//! # pulse-store
//!
//! Durable metric storage for the Pulse presence monitor, backed by
//! SQLite through an r2d2 connection pool.
//!
//! Layers, bottom up:
//!
//! - [`connection`] — pool construction (`new_pool`, [`new_in_memory`])
//! - [`migrations`] — schema setup ([`run_migrations`])
//! - [`repository::MetricRepo`] — stateless row operations over `&Connection`
//! - [`metric_store::MetricStore`] — pool wrapper with busy-retry, the API
//!   the rest of the system uses

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod metric_store;
pub mod migrations;
pub mod repository;

pub use connection::{ConnectionConfig, ConnectionPool, new_in_memory, new_pool};
pub use errors::{Result, StoreError};
pub use metric_store::MetricStore;
pub use migrations::run_migrations;
pub use repository::MetricRepo;
