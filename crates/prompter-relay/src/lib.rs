pub mod registry;

pub use registry::{Session, SessionEntry, SessionRegistry};

use std::time::Duration;

use prompter_platforms::create_platform_integration;
use prompter_provider::SuggestionGenerator;
use prompter_schema::{
    ClientEnvelope, GenerateOptions, PlatformConfig, RelayError, ServerEnvelope,
};
use tokio::sync::broadcast;

const BROADCAST_CAPACITY: usize = 256;

/// Upper bound on one suggestion-generation call; elapsing converts to
/// `GenerationFailed` instead of stalling the connection task.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// The relay dispatcher: owns the session registry, drives platform
/// integrations, invokes the suggestion generator on detected questions and
/// fans results out to every open connection.
///
/// Message handling is per envelope, not per connection. Errors raised while
/// handling one envelope are returned to the caller, which reports them on
/// the originating connection only; the connection itself is never closed
/// here.
pub struct RelayService {
    registry: SessionRegistry,
    generator: SuggestionGenerator,
    events: broadcast::Sender<ServerEnvelope>,
}

impl RelayService {
    pub fn new(generator: SuggestionGenerator) -> Self {
        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            registry: SessionRegistry::new(),
            generator,
            events,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn generator(&self) -> &SuggestionGenerator {
        &self.generator
    }

    /// Subscribe to envelopes addressed to every open connection.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEnvelope> {
        self.events.subscribe()
    }

    /// Deliver to all current subscribers. Each connection forwards from its
    /// own receiver, so one closed or erroring recipient never blocks
    /// delivery to the rest.
    pub fn broadcast(&self, envelope: ServerEnvelope) {
        match self.events.send(envelope) {
            Ok(receivers) => tracing::debug!(receivers, "broadcast delivered"),
            Err(_) => tracing::debug!("broadcast dropped: no open connections"),
        }
    }

    /// Handle one raw text frame, returning the envelopes to send back on
    /// the originating connection.
    pub async fn handle_text(&self, raw: &str) -> Result<Vec<ServerEnvelope>, RelayError> {
        self.handle(ClientEnvelope::parse(raw)?).await
    }

    pub async fn handle(
        &self,
        envelope: ClientEnvelope,
    ) -> Result<Vec<ServerEnvelope>, RelayError> {
        match envelope {
            ClientEnvelope::StartSession {
                platform,
                session_id,
                config,
            } => self.start_session(&platform, session_id, &config).await,
            ClientEnvelope::Transcription {
                session_id,
                text,
                options,
            } => {
                self.handle_transcription(&session_id, &text, options)
                    .await?;
                Ok(Vec::new())
            }
            ClientEnvelope::EndSession { session_id } => {
                self.end_session(&session_id).await;
                Ok(Vec::new())
            }
        }
    }

    /// Create the platform integration, start listening, then register the
    /// session. A listen failure therefore leaves nothing behind. A reused
    /// session id overwrites the old entry, whose integration is shut down
    /// best-effort.
    pub async fn start_session(
        &self,
        platform: &str,
        session_id: String,
        config: &PlatformConfig,
    ) -> Result<Vec<ServerEnvelope>, RelayError> {
        tracing::info!(platform, session_id = %session_id, "starting session");
        let mut integration = create_platform_integration(platform, config).await?;
        let platform_tag = integration.platform();

        let mut replies = Vec::new();
        if integration.requires_credentials() {
            if let Some(credentials) = &config.credentials {
                let status = if integration.validate_credentials(credentials).await {
                    "valid"
                } else {
                    "invalid"
                };
                replies.push(ServerEnvelope::CredentialsStatus {
                    status: status.to_string(),
                });
            }
        }

        integration.start_listening().await?;

        if let Some(mut displaced) = self
            .registry
            .insert(session_id.clone(), platform_tag, integration)
            .await
        {
            tracing::warn!(
                session_id = %session_id,
                "session id reused; disconnecting previous integration"
            );
            displaced.integration.stop_listening().await;
        }

        tracing::info!(session_id = %session_id, "session started");
        replies.push(ServerEnvelope::SessionStarted {
            session_id,
            platform: None,
        });
        Ok(replies)
    }

    async fn handle_transcription(
        &self,
        session_id: &str,
        text: &str,
        options: Option<GenerateOptions>,
    ) -> Result<(), RelayError> {
        self.registry.append_transcript(session_id, text).await?;
        tracing::debug!(session_id, "transcript received: {text}");

        // Question heuristic: a literal '?' anywhere in the fragment.
        if !text.contains('?') {
            return Ok(());
        }

        tracing::info!(session_id, "question detected, generating suggestions");
        let options = options.unwrap_or_default();
        let suggestions = match tokio::time::timeout(
            GENERATION_TIMEOUT,
            self.generator.generate(text, &options),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RelayError::GenerationFailed(format!(
                    "timed out after {}s",
                    GENERATION_TIMEOUT.as_secs()
                )))
            }
        };

        self.broadcast(ServerEnvelope::AiResponse { suggestions });
        Ok(())
    }

    /// Remove the session and shut down its own integration handle.
    /// Best-effort: nothing here propagates to the caller.
    pub async fn end_session(&self, session_id: &str) {
        match self.registry.remove(session_id).await {
            Some(mut entry) => {
                tracing::info!(session_id, "ending session");
                entry.integration.stop_listening().await;
                entry.integration.disconnect().await;
            }
            None => tracing::warn!(session_id, "end requested for unknown session"),
        }
    }

    /// REST connect path: same factory flow as START_SESSION, announced to
    /// every open connection instead of replied to one.
    pub async fn connect_platform(
        &self,
        platform: &str,
        session_id: String,
        config: &PlatformConfig,
    ) -> Result<(), RelayError> {
        if config.meeting_link.is_none() {
            return Err(RelayError::MissingConfiguration(
                "meetingLink is required".to_string(),
            ));
        }

        let integration = create_platform_integration(platform, config).await?;
        let platform_tag = integration.platform();

        if let Some(mut displaced) = self
            .registry
            .insert(session_id.clone(), platform_tag, integration)
            .await
        {
            displaced.integration.stop_listening().await;
        }

        self.broadcast(ServerEnvelope::SessionStarted {
            session_id,
            platform: Some(platform_tag.to_string()),
        });
        Ok(())
    }

    /// Tear down every session; used on shutdown and for test isolation.
    pub async fn shutdown(&self) {
        for mut entry in self.registry.clear().await {
            entry.integration.stop_listening().await;
        }
    }
}
