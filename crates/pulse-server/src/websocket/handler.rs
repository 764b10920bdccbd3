//! WebSocket upgrade and per-socket serving.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use pulse_core::events::PulseEvent;
use pulse_core::types::ContactAddress;

use crate::state::AppState;
use crate::websocket::connection::{CLIENT_QUEUE_CAPACITY, ClientConnection, new_connection_id};

/// Commands a dashboard client may send over the socket.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Start tracking a contact by raw number.
    #[serde(rename = "add-contact")]
    AddContact {
        /// Raw number, normalized server-side.
        number: String,
    },
    /// Stop tracking a contact.
    #[serde(rename = "remove-contact")]
    RemoveContact {
        /// Canonical address.
        address: ContactAddress,
    },
}

/// Upgrade handler mounted at `/ws`.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

/// Greeting sent to a client right after it registers: the connection
/// state (only when the session is up) followed by the tracked-contacts
/// snapshot. Registration happens first, so no live event can fall into
/// the gap between snapshot and stream.
fn initial_events(state: &AppState) -> Vec<PulseEvent> {
    let mut events = Vec::with_capacity(2);
    if state.supervisor.is_connected() {
        events.push(PulseEvent::ConnectionOpen);
    }
    events.push(PulseEvent::TrackedContacts {
        contacts: state.registry.snapshot(),
    });
    events
}

async fn serve_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(CLIENT_QUEUE_CAPACITY);
    let id = new_connection_id();

    state
        .broadcast
        .register(ClientConnection::new(id.clone(), tx.clone()));
    for event in initial_events(&state) {
        send_event(&tx, &event).await;
    }

    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::Text(payload.as_str().into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => handle_command(&state, &tx, text.as_str()).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.broadcast.unregister(&id);
    writer.abort();
    debug!(connection = %id, "websocket closed");
}

/// Dispatch one inbound command. Failures are answered with an `error`
/// event on this socket only — other clients never see another client's
/// mistakes.
async fn handle_command(state: &AppState, tx: &mpsc::Sender<Arc<String>>, raw: &str) {
    let command = match serde_json::from_str::<ClientCommand>(raw) {
        Ok(command) => command,
        Err(e) => {
            send_event(
                tx,
                &PulseEvent::TrackerError {
                    address: ContactAddress::new(""),
                    message: format!("unrecognized command: {e}"),
                },
            )
            .await;
            return;
        }
    };

    let failure = match command {
        ClientCommand::AddContact { number } => {
            // Echo the normalized form so the dashboard can correlate the
            // failure with the entry it rendered for the cleaned digits.
            let digits: String = number.chars().filter(char::is_ascii_digit).collect();
            state
                .registry
                .add(&number)
                .await
                .map(|_| ())
                .err()
                .map(|e| (ContactAddress::new(digits), e))
        }
        ClientCommand::RemoveContact { address } => state
            .registry
            .remove(&address)
            .err()
            .map(|e| (address, e)),
    };

    if let Some((address, error)) = failure {
        warn!(contact = %address, error = %error, "command failed");
        send_event(
            tx,
            &PulseEvent::TrackerError {
                address,
                message: error.to_string(),
            },
        )
        .await;
    }
}

async fn send_event(tx: &mpsc::Sender<Arc<String>>, event: &PulseEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            let _ = tx.send(Arc::new(json)).await;
        }
        Err(e) => warn!(error = %e, "failed to serialize event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use assert_matches::assert_matches;

    #[test]
    fn add_contact_command_parses() {
        let command: ClientCommand =
            serde_json::from_str(r#"{"type":"add-contact","number":"+1 555 123 4567"}"#).unwrap();
        assert_eq!(
            command,
            ClientCommand::AddContact {
                number: "+1 555 123 4567".into()
            }
        );
    }

    #[test]
    fn remove_contact_command_parses() {
        let command: ClientCommand =
            serde_json::from_str(r#"{"type":"remove-contact","address":"c1@test.net"}"#).unwrap();
        assert_eq!(
            command,
            ClientCommand::RemoveContact {
                address: ContactAddress::new("c1@test.net")
            }
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"self-destruct"}"#).is_err());
        assert!(serde_json::from_str::<ClientCommand>(r#"{"number":"123"}"#).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn greeting_ends_with_snapshot() {
        let state = test_state();
        let _ = state.registry.add("15551234567").await.unwrap();

        let events = initial_events(&state);
        // Session never connected in this test, so no connection-open.
        assert_eq!(events.len(), 1);
        assert_matches!(
            &events[0],
            PulseEvent::TrackedContacts { contacts } if contacts.len() == 1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_command_answers_only_this_socket() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(8);
        let (other_tx, mut other_rx) = mpsc::channel(8);
        state
            .broadcast
            .register(ClientConnection::new("other".into(), other_tx));

        handle_command(&state, &tx, r#"{"type":"remove-contact","address":"ghost"}"#).await;

        let json = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["address"], "ghost");
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn add_failure_echoes_normalized_address() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(8);

        // Six digits: resolves as not-on-network.
        handle_command(
            &state,
            &tx,
            r#"{"type":"add-contact","number":"+1 (555) 12"}"#,
        )
        .await;

        let json = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["address"], "155512");
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_json_answers_with_error() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(8);

        handle_command(&state, &tx, "not json").await;

        let json = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
    }
}
