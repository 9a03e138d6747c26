pub mod factory;
pub mod meet;
pub mod slack;
pub mod teams;
pub mod zoom;

pub use factory::{create_platform_integration, new_integration};

use async_trait::async_trait;
use prompter_schema::{Platform, PlatformConfig, PlatformCredentials, RelayError};

/// Retries allowed after the first failed listen attempt.
pub const MAX_LISTEN_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Uniform capability surface over all platform variants.
///
/// Adapters are stub-level: they track connectivity state and log instead of
/// driving a real meeting client, but the contract (required configuration,
/// error kinds, retry bounds) is the one the relay depends on.
#[async_trait]
pub trait PlatformIntegration: Send + Sync {
    fn platform(&self) -> Platform;

    fn state(&self) -> ConnectionState;

    /// Whether `connect` needs client credentials before it can succeed.
    fn requires_credentials(&self) -> bool {
        false
    }

    /// Establish the logical connection. Calling while already connected is
    /// allowed: the last call wins.
    async fn connect(&mut self, config: &PlatformConfig) -> Result<(), RelayError>;

    /// Release any live connection. Safe to call repeatedly; never fails.
    async fn disconnect(&mut self);

    async fn send_message(&mut self, text: &str) -> Result<(), RelayError>;

    /// One listen attempt. `start_listening` wraps this in the uniform
    /// bounded retry; implementations must not retry themselves.
    async fn begin_listen(&mut self) -> Result<(), RelayError>;

    async fn start_listening(&mut self) -> Result<(), RelayError> {
        let mut retries = 0;
        loop {
            match self.begin_listen().await {
                Ok(()) => return Ok(()),
                Err(err) if retries < MAX_LISTEN_RETRIES => {
                    retries += 1;
                    tracing::warn!(
                        platform = %self.platform(),
                        retries,
                        "listen attempt failed: {err}; retrying"
                    );
                }
                Err(err) => {
                    tracing::error!(platform = %self.platform(), "listener failed: {err}");
                    return Err(RelayError::ListenFailed { retries });
                }
            }
        }
    }

    async fn stop_listening(&mut self) {
        self.disconnect().await;
    }

    /// Structural check only; real validation is deferred to the provider.
    async fn validate_credentials(&self, credentials: &PlatformCredentials) -> bool {
        credentials.is_complete()
    }
}

pub(crate) fn require_credentials<'a>(
    config: &'a PlatformConfig,
    platform: &str,
) -> Result<&'a PlatformCredentials, RelayError> {
    config
        .credentials
        .as_ref()
        .filter(|c| c.is_complete())
        .ok_or_else(|| {
            RelayError::MissingConfiguration(format!("{platform} requires client credentials"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyIntegration {
        attempts: Arc<AtomicU32>,
        succeed_after: u32,
    }

    #[async_trait]
    impl PlatformIntegration for FlakyIntegration {
        fn platform(&self) -> Platform {
            Platform::Zoom
        }

        fn state(&self) -> ConnectionState {
            ConnectionState::Connected
        }

        async fn connect(&mut self, _config: &PlatformConfig) -> Result<(), RelayError> {
            Ok(())
        }

        async fn disconnect(&mut self) {}

        async fn send_message(&mut self, _text: &str) -> Result<(), RelayError> {
            Ok(())
        }

        async fn begin_listen(&mut self) -> Result<(), RelayError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt > self.succeed_after {
                Ok(())
            } else {
                Err(RelayError::ConnectionFailed(format!(
                    "attempt {attempt} refused"
                )))
            }
        }
    }

    #[tokio::test]
    async fn start_listening_exhausts_three_retries() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut integration = FlakyIntegration {
            attempts: attempts.clone(),
            succeed_after: u32::MAX,
        };

        let err = integration.start_listening().await.unwrap_err();
        assert!(matches!(err, RelayError::ListenFailed { retries: 3 }));
        // initial attempt plus three retries
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn start_listening_recovers_within_bound() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut integration = FlakyIntegration {
            attempts: attempts.clone(),
            succeed_after: 2,
        };

        integration.start_listening().await.unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn default_credential_validation_checks_presence() {
        let integration = FlakyIntegration {
            attempts: Arc::new(AtomicU32::new(0)),
            succeed_after: 0,
        };
        assert!(
            integration
                .validate_credentials(&PlatformCredentials::new("id", "secret"))
                .await
        );
        assert!(
            !integration
                .validate_credentials(&PlatformCredentials::default())
                .await
        );
    }
}
