use async_trait::async_trait;
use prompter_schema::{Platform, PlatformConfig, RelayError};

use crate::{require_credentials, ConnectionState, PlatformIntegration};

/// Google Meet needs an OAuth client before it can join a meeting.
#[derive(Debug, Default)]
pub struct MeetIntegration {
    config: Option<PlatformConfig>,
    state: ConnectionState,
}

impl MeetIntegration {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformIntegration for MeetIntegration {
    fn platform(&self) -> Platform {
        Platform::Meet
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    async fn connect(&mut self, config: &PlatformConfig) -> Result<(), RelayError> {
        let credentials = require_credentials(config, "google meet")?;

        self.state = ConnectionState::Connecting;
        self.config = Some(config.clone());
        tracing::info!(
            client_id = credentials.client_id.as_deref().unwrap_or_default(),
            "connected to Google Meet"
        );
        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!("disconnected from Google Meet");
        }
        self.state = ConnectionState::Disconnected;
    }

    async fn send_message(&mut self, text: &str) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::DeliveryFailed(
                "google meet: not connected".to_string(),
            ));
        }
        tracing::info!("sending message to Google Meet: {text}");
        Ok(())
    }

    async fn begin_listen(&mut self) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::ConnectionFailed(
                "google meet: not connected".to_string(),
            ));
        }
        tracing::info!("listening for Google Meet events");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompter_schema::PlatformCredentials;

    #[tokio::test]
    async fn connect_requires_credentials() {
        let mut meet = MeetIntegration::new();
        let err = meet
            .connect(&PlatformConfig::with_meeting_link("https://meet.google.com/abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingConfiguration(_)));
    }

    #[tokio::test]
    async fn connect_with_credentials() {
        let mut meet = MeetIntegration::new();
        let config = PlatformConfig::with_meeting_link("https://meet.google.com/abc")
            .with_credentials(PlatformCredentials::new("cid", "secret"));
        meet.connect(&config).await.unwrap();
        assert_eq!(meet.state(), ConnectionState::Connected);
        assert!(meet.requires_credentials());
    }

    #[tokio::test]
    async fn empty_secret_is_rejected() {
        let mut meet = MeetIntegration::new();
        let config = PlatformConfig::default()
            .with_credentials(PlatformCredentials::new("cid", ""));
        let err = meet.connect(&config).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingConfiguration(_)));
    }
}
