use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use prompter_schema::ServerEnvelope;
use tokio::sync::broadcast;

use crate::state::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One task per connection. Inbound frames run through the relay; direct
/// replies and error envelopes go back on this socket only, while the
/// relay's broadcast subscription is drained into the same socket. A handling
/// error never closes the connection.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("connection established");
    let mut events = state.relay.subscribe();

    loop {
        tokio::select! {
            frame = socket.recv() => {
                let Some(Ok(message)) = frame else { break };
                match message {
                    Message::Text(text) => {
                        match state.relay.handle_text(text.as_str()).await {
                            Ok(replies) => {
                                for reply in replies {
                                    if send_envelope(&mut socket, &reply).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(err) => {
                                tracing::warn!("envelope handling failed: {err}");
                                let reply = ServerEnvelope::Error {
                                    error: err.to_string(),
                                };
                                if send_envelope(&mut socket, &reply).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = events.recv() => {
                match event {
                    Ok(envelope) => {
                        if send_envelope(&mut socket, &envelope).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "connection lagged behind broadcasts");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::info!("connection closed");
}

async fn send_envelope(socket: &mut WebSocket, envelope: &ServerEnvelope) -> Result<(), axum::Error> {
    socket.send(Message::Text(envelope.to_json().into())).await
}
