use thiserror::Error;

/// Errors produced by the relay core and its collaborators.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("message delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("failed to establish listener after {retries} retries")]
    ListenFailed { retries: u32 },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("platform integration failed: {0}")]
    PlatformIntegrationFailed(#[source] Box<RelayError>),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("duplicate session: {0}")]
    DuplicateSession(String),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("failed to generate response suggestions: {0}")]
    GenerationFailed(String),

    /// Malformed envelope: invalid JSON or a missing/ill-typed field.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
}
