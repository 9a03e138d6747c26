//! Consumer-side mirror of the relay: opens the persistent connection, sends
//! the session start, republishes broadcasts on a typed channel and
//! reconnects with bounded exponential backoff on unexpected closes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use prompter_schema::{
    ClientEnvelope, GenerateOptions, PlatformConfig, RelayError, ServerEnvelope, Suggestion,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

pub const MAX_RECONNECT_ATTEMPTS: u32 = 3;
const EVENT_CAPACITY: usize = 64;
const OUTBOUND_CAPACITY: usize = 32;

/// Events republished to local consumers (UI state, notifications).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Suggestions(Vec<Suggestion>),
    Error(String),
    CredentialsStatus(String),
}

/// Backoff before reconnect attempt `attempt` (1-based): 1000ms * 2^attempt.
pub fn reconnect_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * 2u64.pow(attempt))
}

/// Owns one persistent connection for a client session.
pub struct ConnectionManager {
    url: String,
    platform: String,
    config: PlatformConfig,
    session_id: String,
    events: broadcast::Sender<ClientEvent>,
    closed: Arc<AtomicBool>,
    outbound: tokio::sync::Mutex<Option<mpsc::Sender<ClientEnvelope>>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        platform: impl Into<String>,
        config: PlatformConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            url: url.into(),
            platform: platform.into(),
            config,
            session_id: Uuid::new_v4().simple().to_string(),
            events,
            closed: Arc::new(AtomicBool::new(false)),
            outbound: tokio::sync::Mutex::new(None),
            task: tokio::sync::Mutex::new(None),
        }
    }

    /// Locally generated id, stable across reconnects of this manager.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Open the connection in the background. On every successful open the
    /// session start is re-sent and the reconnect counter resets.
    pub async fn connect(&self) {
        let mut task = self.task.lock().await;
        if let Some(old) = task.take() {
            old.abort();
        }
        self.closed.store(false, Ordering::SeqCst);

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        *self.outbound.lock().await = Some(outbound_tx);

        let start = ClientEnvelope::StartSession {
            platform: self.platform.clone(),
            session_id: self.session_id.clone(),
            config: self.config.clone(),
        };
        *task = Some(tokio::spawn(run(
            self.url.clone(),
            start,
            self.events.clone(),
            self.closed.clone(),
            outbound_rx,
        )));
    }

    /// Queue a transcript fragment for the relay. Fragments queued while the
    /// connection is down are flushed after a successful reconnect.
    pub async fn send_transcription(
        &self,
        text: impl Into<String>,
        options: Option<GenerateOptions>,
    ) -> Result<(), RelayError> {
        self.send(ClientEnvelope::Transcription {
            session_id: self.session_id.clone(),
            text: text.into(),
            options,
        })
        .await
    }

    pub async fn end_session(&self) -> Result<(), RelayError> {
        self.send(ClientEnvelope::EndSession {
            session_id: self.session_id.clone(),
        })
        .await
    }

    async fn send(&self, envelope: ClientEnvelope) -> Result<(), RelayError> {
        let guard = self.outbound.lock().await;
        let Some(tx) = guard.as_ref() else {
            return Err(RelayError::DeliveryFailed("not connected".to_string()));
        };
        tx.send(envelope)
            .await
            .map_err(|_| RelayError::DeliveryFailed("connection task stopped".to_string()))
    }

    /// Manual disconnect; suppresses the automatic reconnect path.
    pub async fn disconnect(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.outbound.lock().await = None;
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }
        tracing::info!("connection closed by request");
    }
}

async fn run(
    url: String,
    start: ClientEnvelope,
    events: broadcast::Sender<ClientEvent>,
    closed: Arc<AtomicBool>,
    mut outbound: mpsc::Receiver<ClientEnvelope>,
) {
    let mut attempts: u32 = 0;
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut socket, _)) => {
                tracing::info!(url = %url, "connection established");
                attempts = 0;
                let payload = serde_json::to_string(&start).unwrap_or_default();
                if socket.send(Message::Text(payload.into())).await.is_ok() {
                    loop {
                        tokio::select! {
                            frame = socket.next() => {
                                match frame {
                                    Some(Ok(Message::Text(text))) => dispatch(&events, text.as_str()),
                                    Some(Ok(Message::Close(_))) | None => break,
                                    Some(Ok(_)) => {}
                                    Some(Err(err)) => {
                                        tracing::warn!("socket error: {err}");
                                        break;
                                    }
                                }
                            }
                            queued = outbound.recv() => {
                                let Some(envelope) = queued else { return };
                                let payload = serde_json::to_string(&envelope).unwrap_or_default();
                                if socket.send(Message::Text(payload.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!("connection failed: {err}");
                let _ = events.send(ClientEvent::Error(err.to_string()));
            }
        }

        if closed.load(Ordering::SeqCst) {
            return;
        }
        if attempts >= MAX_RECONNECT_ATTEMPTS {
            let _ = events.send(ClientEvent::Error(
                "reconnect attempts exhausted".to_string(),
            ));
            return;
        }
        attempts += 1;
        let delay = reconnect_delay(attempts);
        tracing::info!(attempt = attempts, ?delay, "reconnecting after unexpected close");
        tokio::time::sleep(delay).await;
    }
}

fn dispatch(events: &broadcast::Sender<ClientEvent>, raw: &str) {
    let envelope: ServerEnvelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!("undecodable server envelope: {err}");
            return;
        }
    };

    match envelope {
        ServerEnvelope::AiResponse { suggestions } => {
            let _ = events.send(ClientEvent::Suggestions(suggestions));
        }
        ServerEnvelope::Error { error } => {
            tracing::error!("relay error: {error}");
            let _ = events.send(ClientEvent::Error(error));
        }
        ServerEnvelope::CredentialsStatus { status } => {
            let _ = events.send(ClientEvent::CredentialsStatus(status));
        }
        ServerEnvelope::SessionStarted { session_id, .. } => {
            tracing::debug!(session_id = %session_id, "session acknowledged");
        }
    }
}

/// Probe whether a platform needs client credentials, via the HTTP API.
/// Any failure reads as "no".
pub async fn check_requires_credentials(api_base: &str, platform: &str) -> bool {
    let url = format!(
        "{}/api/platform/check-requirements",
        api_base.trim_end_matches('/')
    );
    let request = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "platform": platform }));

    match request.send().await {
        Ok(resp) => match resp.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("requiresCredentials")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            Err(err) => {
                tracing::warn!("check-requirements decode failed: {err}");
                false
            }
        },
        Err(err) => {
            tracing::warn!("check-requirements request failed: {err}");
            false
        }
    }
}
