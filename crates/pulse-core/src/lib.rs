//! # pulse-core
//!
//! Foundation types for the Pulse presence monitor.
//!
//! This crate provides the shared vocabulary that all other Pulse crates
//! depend on:
//!
//! - **Identifiers**: [`types::ContactAddress`], [`types::DeviceAddress`] as newtypes
//! - **States**: [`types::RawDeviceState`] (per device, as reported),
//!   [`types::ActivityState`] (classified, persisted),
//!   [`types::TrackerState`] (per-session state machine)
//! - **Records**: [`types::DeviceSample`], [`types::Metric`], [`types::AnalysisResult`]
//! - **Events**: [`events::PulseEvent`] broadcast to live observers
//! - **Fan-out**: [`hub::EventHub`] publish/subscribe channel
//! - **Logging**: [`logging::init`] tracing-subscriber setup for binaries
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other pulse crates.

#![deny(unsafe_code)]

pub mod events;
pub mod hub;
pub mod logging;
pub mod types;
