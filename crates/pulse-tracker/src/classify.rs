//! Reduce per-device samples to one contact-level state.

use pulse_core::types::{ActivityState, DeviceSample, RawDeviceState};

/// Contact-level outcome of one probe tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classified {
    /// The state persisted and broadcast for this tick.
    pub state: ActivityState,
    /// RTT of the winning device, milliseconds.
    pub rtt: u64,
}

/// Strategy for collapsing a contact's device samples into one state.
///
/// A seam for experimentation; [`MostRecentWins`] is the default and the
/// only strategy shipped.
pub trait DeviceReducer: Send + Sync {
    /// Reduce the tick's samples. An empty slice means no device responded.
    fn reduce(&self, samples: &[DeviceSample]) -> Classified;
}

/// The freshest responsive device speaks for the contact.
///
/// The winner is the sample with the latest `observed_at` whose raw state
/// is `Online` or `Standby`. `Calibrating` devices never win (they have no
/// classifiable state yet), and a contact with no responsive device is
/// `Offline` — carrying the freshest measured RTT when any device answered
/// at all, zero when none did.
pub struct MostRecentWins;

impl DeviceReducer for MostRecentWins {
    fn reduce(&self, samples: &[DeviceSample]) -> Classified {
        let responsive = samples
            .iter()
            .filter(|s| {
                matches!(
                    s.raw_state,
                    RawDeviceState::Online | RawDeviceState::Standby
                )
            })
            .max_by_key(|s| s.observed_at);

        if let Some(winner) = responsive {
            let state = match winner.raw_state {
                RawDeviceState::Online => ActivityState::Online,
                _ => ActivityState::Standby,
            };
            return Classified {
                state,
                rtt: winner.rtt_millis,
            };
        }

        let rtt = samples
            .iter()
            .max_by_key(|s| s.observed_at)
            .map_or(0, |s| s.rtt_millis);
        Classified {
            state: ActivityState::Offline,
            rtt,
        }
    }
}
