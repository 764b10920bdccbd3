//! Session supervision: reconnect-with-backoff over the shared session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pulse_core::events::PulseEvent;
use pulse_core::hub::EventHub;

use crate::client::{LifecycleEvent, ProtocolClient};

/// Reconnect backoff policy: exponential doubling from `base` to `max`,
/// with ±25% jitter, reset after a successful connect.
#[derive(Clone, Copy, Debug)]
pub struct BackoffConfig {
    /// Initial delay.
    pub base: Duration,
    /// Delay ceiling.
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl BackoffConfig {
    /// Delay for the given 0-based attempt, jittered.
    fn delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        let exp = base_ms.saturating_mul(1_u64 << attempt.min(16)).min(max_ms);
        let jitter_range = exp / 4;
        let jitter = if jitter_range > 0 {
            rand::random::<u64>() % (jitter_range * 2 + 1)
        } else {
            0
        };
        Duration::from_millis(exp.saturating_sub(jitter_range) + jitter)
    }
}

/// Owns the single shared protocol session.
///
/// Connects, forwards lifecycle events into the hub, and reconnects with
/// backoff when the session drops. Probes keep scheduling throughout an
/// outage; they observe transport errors and degrade to Offline until the
/// session recovers.
pub struct SessionSupervisor {
    client: Arc<dyn ProtocolClient>,
    hub: Arc<EventHub>,
    backoff: BackoffConfig,
    connected: AtomicBool,
}

impl SessionSupervisor {
    /// Create a supervisor over the given client and hub.
    pub fn new(client: Arc<dyn ProtocolClient>, hub: Arc<EventHub>, backoff: BackoffConfig) -> Self {
        Self {
            client,
            hub,
            backoff,
            connected: AtomicBool::new(false),
        }
    }

    /// Whether the session is currently established.
    ///
    /// Read at WebSocket-subscribe time so late joiners get an immediate
    /// `connection-open` replay while the session is up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Supervision loop. Runs until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            // Subscribe before connecting so a challenge raised during the
            // handshake is not missed.
            let mut lifecycle = self.client.lifecycle();

            match self.client.connect().await {
                Ok(()) => {
                    attempt = 0;
                    self.connected.store(true, Ordering::Relaxed);
                    info!("protocol session opened");
                    let _ = self.hub.publish(PulseEvent::ConnectionOpen);
                }
                Err(e) => {
                    let delay = self.backoff.delay(attempt);
                    attempt = attempt.saturating_add(1);
                    warn!(error = %e, ?delay, attempt, "connect failed, backing off");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                    continue;
                }
            }

            // Session is up: pump lifecycle events until it closes.
            loop {
                let event = tokio::select! {
                    () = cancel.cancelled() => {
                        self.connected.store(false, Ordering::Relaxed);
                        return;
                    }
                    event = lifecycle.recv() => event,
                };
                match event {
                    Ok(LifecycleEvent::PairingChallenge { payload }) => {
                        info!("pairing challenge received");
                        let _ = self.hub.publish(PulseEvent::Qr { payload });
                    }
                    Ok(LifecycleEvent::SessionOpened) => {
                        // Already published on connect.
                    }
                    Ok(LifecycleEvent::SessionClosed { reason }) => {
                        self.connected.store(false, Ordering::Relaxed);
                        warn!(reason, "protocol session closed, reconnecting");
                        let _ = self.hub.publish(PulseEvent::ConnectionClosed { reason });
                        break;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "lifecycle receiver lagged");
                    }
                    Err(RecvError::Closed) => {
                        self.connected.store(false, Ordering::Relaxed);
                        warn!("lifecycle channel closed, stopping supervision");
                        return;
                    }
                }
            }
        }
        self.connected.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_core::types::{ContactAddress, DeviceSample};
    use std::sync::atomic::AtomicU32;
    use tokio::sync::broadcast;

    use crate::client::Resolution;
    use crate::errors::ProtocolError;

    /// Client whose first `fail_first` connect attempts fail.
    struct FlakyClient {
        lifecycle_tx: broadcast::Sender<LifecycleEvent>,
        attempts: AtomicU32,
        fail_first: u32,
    }

    impl FlakyClient {
        fn new(fail_first: u32) -> Self {
            let (lifecycle_tx, _) = broadcast::channel(16);
            Self {
                lifecycle_tx,
                attempts: AtomicU32::new(0),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl ProtocolClient for FlakyClient {
        async fn connect(&self) -> Result<(), ProtocolError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(ProtocolError::Transport("refused".into()))
            } else {
                Ok(())
            }
        }

        async fn resolve(&self, _raw_number: &str) -> Result<Resolution, ProtocolError> {
            Ok(Resolution {
                exists: false,
                address: ContactAddress::new(""),
                display_name: None,
            })
        }

        async fn probe(
            &self,
            _address: &ContactAddress,
        ) -> Result<Vec<DeviceSample>, ProtocolError> {
            Ok(vec![])
        }

        fn lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
            self.lifecycle_tx.subscribe()
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let backoff = BackoffConfig {
            base: Duration::from_millis(100),
            max: Duration::from_millis(1_000),
        };
        // Jitter is ±25%, so compare against the envelope.
        let d0 = backoff.delay(0);
        assert!(d0 >= Duration::from_millis(75) && d0 <= Duration::from_millis(125));
        let d10 = backoff.delay(10);
        assert!(d10 <= Duration::from_millis(1_250));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_retries_then_publishes_open() {
        let client = Arc::new(FlakyClient::new(2));
        let hub = Arc::new(EventHub::new());
        let mut rx = hub.subscribe();
        let supervisor = Arc::new(SessionSupervisor::new(
            Arc::clone(&client) as Arc<dyn ProtocolClient>,
            Arc::clone(&hub),
            BackoffConfig {
                base: Duration::from_millis(10),
                max: Duration::from_millis(100),
            },
        ));

        let cancel = CancellationToken::new();
        let sup = Arc::clone(&supervisor);
        let token = cancel.clone();
        let task = tokio::spawn(async move { sup.run(token).await });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "connection-open");
        assert!(supervisor.is_connected());
        assert_eq!(client.attempts.load(Ordering::SeqCst), 3);

        cancel.cancel();
        task.await.unwrap();
        assert!(!supervisor.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn session_close_triggers_reconnect() {
        let client = Arc::new(FlakyClient::new(0));
        let hub = Arc::new(EventHub::new());
        let mut rx = hub.subscribe();
        let supervisor = Arc::new(SessionSupervisor::new(
            Arc::clone(&client) as Arc<dyn ProtocolClient>,
            Arc::clone(&hub),
            BackoffConfig {
                base: Duration::from_millis(10),
                max: Duration::from_millis(100),
            },
        ));

        let cancel = CancellationToken::new();
        let sup = Arc::clone(&supervisor);
        let token = cancel.clone();
        let task = tokio::spawn(async move { sup.run(token).await });

        assert_eq!(rx.recv().await.unwrap().event_type(), "connection-open");

        let _ = client.lifecycle_tx.send(LifecycleEvent::SessionClosed {
            reason: "stream error".into(),
        });
        assert_eq!(rx.recv().await.unwrap().event_type(), "connection-closed");
        // Reconnect happens after backoff.
        assert_eq!(rx.recv().await.unwrap().event_type(), "connection-open");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pairing_challenge_forwarded_as_qr() {
        let client = Arc::new(FlakyClient::new(0));
        let hub = Arc::new(EventHub::new());
        let mut rx = hub.subscribe();
        let supervisor = SessionSupervisor::new(
            Arc::clone(&client) as Arc<dyn ProtocolClient>,
            Arc::clone(&hub),
            BackoffConfig::default(),
        );
        let supervisor = Arc::new(supervisor);

        let cancel = CancellationToken::new();
        let sup = Arc::clone(&supervisor);
        let token = cancel.clone();
        let task = tokio::spawn(async move { sup.run(token).await });

        assert_eq!(rx.recv().await.unwrap().event_type(), "connection-open");

        let _ = client.lifecycle_tx.send(LifecycleEvent::PairingChallenge {
            payload: "challenge-bytes".into(),
        });
        let event = rx.recv().await.unwrap();
        assert_matches::assert_matches!(
            event,
            PulseEvent::Qr { payload } if payload == "challenge-bytes"
        );

        cancel.cancel();
        task.await.unwrap();
    }
}
