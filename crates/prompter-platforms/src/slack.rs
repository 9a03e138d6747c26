//! Slack adapter.
//!
//! Relays into a Slack huddle/channel rather than a video call. Like the
//! other credentialed variants this is a stub around the connectivity state
//! machine; message delivery logs instead of calling chat.postMessage.

use async_trait::async_trait;
use prompter_schema::{Platform, PlatformConfig, RelayError};

use crate::{require_credentials, ConnectionState, PlatformIntegration};

#[derive(Debug, Default)]
pub struct SlackIntegration {
    config: Option<PlatformConfig>,
    state: ConnectionState,
}

impl SlackIntegration {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformIntegration for SlackIntegration {
    fn platform(&self) -> Platform {
        Platform::Slack
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    async fn connect(&mut self, config: &PlatformConfig) -> Result<(), RelayError> {
        let credentials = require_credentials(config, "slack")?;

        self.state = ConnectionState::Connecting;
        self.config = Some(config.clone());
        tracing::info!(
            client_id = credentials.client_id.as_deref().unwrap_or_default(),
            "connected to Slack"
        );
        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!("disconnected from Slack");
        }
        self.state = ConnectionState::Disconnected;
    }

    async fn send_message(&mut self, text: &str) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::DeliveryFailed(
                "slack: not connected".to_string(),
            ));
        }
        // TODO: post via chat.postMessage once a Slack app token is wired in
        tracing::info!("sending message to Slack: {text}");
        Ok(())
    }

    async fn begin_listen(&mut self) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::ConnectionFailed(
                "slack: not connected".to_string(),
            ));
        }
        tracing::info!("listening for Slack events");
        Ok(())
    }
}
