use async_trait::async_trait;
use prompter_schema::{Platform, PlatformConfig, RelayError};

use crate::{ConnectionState, PlatformIntegration};

/// Zoom joins by meeting link alone; no client credentials involved.
#[derive(Debug, Default)]
pub struct ZoomIntegration {
    config: Option<PlatformConfig>,
    state: ConnectionState,
}

impl ZoomIntegration {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformIntegration for ZoomIntegration {
    fn platform(&self) -> Platform {
        Platform::Zoom
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    async fn connect(&mut self, config: &PlatformConfig) -> Result<(), RelayError> {
        let Some(link) = config.meeting_link.as_deref().filter(|l| !l.is_empty()) else {
            return Err(RelayError::MissingConfiguration(
                "zoom meeting link is required".to_string(),
            ));
        };

        self.state = ConnectionState::Connecting;
        self.config = Some(config.clone());
        tracing::info!(meeting_link = link, "connected to Zoom meeting");
        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!("disconnected from Zoom");
        }
        self.state = ConnectionState::Disconnected;
    }

    async fn send_message(&mut self, text: &str) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::DeliveryFailed(
                "zoom: not connected".to_string(),
            ));
        }
        tracing::info!("sending message to Zoom: {text}");
        Ok(())
    }

    async fn begin_listen(&mut self) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::ConnectionFailed(
                "zoom: not connected".to_string(),
            ));
        }
        tracing::info!("listening for Zoom events");
        Ok(())
    }
}
