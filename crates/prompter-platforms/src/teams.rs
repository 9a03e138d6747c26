use async_trait::async_trait;
use prompter_schema::{Platform, PlatformConfig, RelayError};

use crate::{require_credentials, ConnectionState, PlatformIntegration};

#[derive(Debug, Default)]
pub struct TeamsIntegration {
    config: Option<PlatformConfig>,
    state: ConnectionState,
}

impl TeamsIntegration {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformIntegration for TeamsIntegration {
    fn platform(&self) -> Platform {
        Platform::Teams
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    async fn connect(&mut self, config: &PlatformConfig) -> Result<(), RelayError> {
        let credentials = require_credentials(config, "microsoft teams")?;

        self.state = ConnectionState::Connecting;
        self.config = Some(config.clone());
        tracing::info!(
            client_id = credentials.client_id.as_deref().unwrap_or_default(),
            "connected to Microsoft Teams"
        );
        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!("disconnected from Microsoft Teams");
        }
        self.state = ConnectionState::Disconnected;
    }

    async fn send_message(&mut self, text: &str) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::DeliveryFailed(
                "microsoft teams: not connected".to_string(),
            ));
        }
        tracing::info!("sending message to Microsoft Teams: {text}");
        Ok(())
    }

    async fn begin_listen(&mut self) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::ConnectionFailed(
                "microsoft teams: not connected".to_string(),
            ));
        }
        tracing::info!("listening for Microsoft Teams events");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompter_schema::PlatformCredentials;

    #[tokio::test]
    async fn connect_requires_credentials() {
        let mut teams = TeamsIntegration::new();
        let err = teams
            .connect(&PlatformConfig::with_meeting_link("https://teams.microsoft.com/l/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingConfiguration(_)));
        assert_eq!(teams.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_with_credentials() {
        let mut teams = TeamsIntegration::new();
        let config = PlatformConfig::with_meeting_link("https://teams.microsoft.com/l/x")
            .with_credentials(PlatformCredentials::new("cid", "secret"));
        teams.connect(&config).await.unwrap();
        assert_eq!(teams.state(), ConnectionState::Connected);
    }
}
