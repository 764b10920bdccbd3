//! Deterministic simulated client.
//!
//! Stands in for the real messaging network so the binary and integration
//! tests run end-to-end. Presence is a pure function of (address, time
//! bucket), so two probes in the same bucket agree and runs are
//! reproducible.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use pulse_core::types::{ContactAddress, DeviceAddress, DeviceSample, RawDeviceState};

use crate::client::{LifecycleEvent, ProtocolClient, Resolution};
use crate::errors::ProtocolError;

/// Length of one simulated activity cycle in seconds.
const CYCLE_SECS: u64 = 300;

/// Simulated messaging-network client.
pub struct SimulatedClient {
    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
    connected: AtomicBool,
    paired: AtomicBool,
}

impl SimulatedClient {
    /// Create a disconnected simulated client.
    pub fn new() -> Self {
        let (lifecycle_tx, _) = broadcast::channel(64);
        Self {
            lifecycle_tx,
            connected: AtomicBool::new(false),
            paired: AtomicBool::new(false),
        }
    }

    fn hash(parts: &[&str]) -> u64 {
        let mut hasher = DefaultHasher::new();
        for part in parts {
            part.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// State of one device within the current cycle.
    ///
    /// Each contact gets a stable phase offset and split points, so
    /// different contacts drift through Online/Standby/Offline at
    /// different times of the cycle.
    fn device_state(address: &ContactAddress, device_index: u64, now_secs: u64) -> RawDeviceState {
        let seed = Self::hash(&[address.as_str(), &device_index.to_string()]);
        let phase = seed % CYCLE_SECS;
        let position = (now_secs + phase) % CYCLE_SECS;
        // Roughly 40% online, 35% standby, 25% offline per cycle.
        let online_until = CYCLE_SECS * 2 / 5;
        let standby_until = online_until + CYCLE_SECS * 7 / 20;
        if position < online_until {
            RawDeviceState::Online
        } else if position < standby_until {
            RawDeviceState::Standby
        } else {
            RawDeviceState::Offline
        }
    }

    fn device_rtt(address: &ContactAddress, device_index: u64, now_secs: u64) -> u64 {
        let seed = Self::hash(&[address.as_str(), &device_index.to_string()]);
        let base = 60 + seed % 200;
        let wobble = Self::hash(&[address.as_str(), &now_secs.to_string()]) % 40;
        base + wobble
    }
}

impl Default for SimulatedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolClient for SimulatedClient {
    async fn connect(&self) -> Result<(), ProtocolError> {
        // First connect raises a pairing challenge, like a fresh install.
        if !self.paired.swap(true, Ordering::SeqCst) {
            let _ = self.lifecycle_tx.send(LifecycleEvent::PairingChallenge {
                payload: "sim:pairing-challenge".to_string(),
            });
        }
        self.connected.store(true, Ordering::SeqCst);
        let _ = self.lifecycle_tx.send(LifecycleEvent::SessionOpened);
        Ok(())
    }

    async fn resolve(&self, raw_number: &str) -> Result<Resolution, ProtocolError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ProtocolError::SessionClosed("not connected".into()));
        }
        let digits: String = raw_number.chars().filter(char::is_ascii_digit).collect();
        let exists = digits.len() >= 7;
        let display_name = exists.then(|| format!("Sim {}", &digits[digits.len() - 4..]));
        Ok(Resolution {
            exists,
            address: ContactAddress::new(format!("{digits}@sim.pulse")),
            display_name,
        })
    }

    async fn probe(&self, address: &ContactAddress) -> Result<Vec<DeviceSample>, ProtocolError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ProtocolError::SessionClosed("not connected".into()));
        }
        let now = Utc::now();
        let now_secs = now.timestamp() as u64;
        let device_count = 1 + Self::hash(&[address.as_str()]) % 2;
        let samples = (0..device_count)
            .map(|index| DeviceSample {
                contact: address.clone(),
                device: DeviceAddress::new(format!("{address}:{index}")),
                rtt_millis: Self::device_rtt(address, index, now_secs),
                raw_state: Self::device_state(address, index, now_secs),
                observed_at: now,
            })
            .collect();
        Ok(samples)
    }

    fn lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle_tx.subscribe()
    }
}
