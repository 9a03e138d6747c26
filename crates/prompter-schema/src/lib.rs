mod error;

pub use error::RelayError;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// External communication platform a session is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Zoom,
    Meet,
    Teams,
    Slack,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Zoom,
        Platform::Meet,
        Platform::Teams,
        Platform::Slack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Zoom => "zoom",
            Platform::Meet => "meet",
            Platform::Teams => "teams",
            Platform::Slack => "slack",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zoom" => Ok(Platform::Zoom),
            "meet" => Ok(Platform::Meet),
            "teams" => Ok(Platform::Teams),
            "slack" => Ok(Platform::Slack),
            other => Err(RelayError::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// OAuth-style client credentials. Held in memory for the lifetime of a
/// connection, never written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCredentials {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

impl PlatformCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            redirect_uri: None,
        }
    }

    /// Structural check only: both client fields present and non-empty.
    pub fn is_complete(&self) -> bool {
        self.client_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Tunables forwarded to the platform integration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub response_delay: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<PlatformCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PlatformSettings>,
}

impl PlatformConfig {
    pub fn with_meeting_link(link: impl Into<String>) -> Self {
        Self {
            meeting_link: Some(link.into()),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, credentials: PlatformCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// One candidate response produced by the suggestion generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    #[default]
    Concise,
    Detailed,
}

/// Generation options passed through unchanged from the client request to
/// the suggestion generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    #[serde(default)]
    pub response_style: ResponseStyle,
    #[serde(default)]
    pub preparation_mode: bool,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_provider() -> String {
    "google".to_string()
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            response_style: ResponseStyle::Concise,
            preparation_mode: false,
            provider: default_provider(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Envelope sent by a client over the persistent connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEnvelope {
    #[serde(rename = "START_SESSION", rename_all = "camelCase")]
    StartSession {
        platform: String,
        session_id: String,
        #[serde(default)]
        config: PlatformConfig,
    },
    #[serde(rename = "TRANSCRIPTION", rename_all = "camelCase")]
    Transcription {
        session_id: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<GenerateOptions>,
    },
    #[serde(rename = "END_SESSION", rename_all = "camelCase")]
    EndSession { session_id: String },
}

impl ClientEnvelope {
    /// Parse a raw text frame. A recognizable but unknown `type` tag maps to
    /// `UnknownMessageType`; anything else malformed maps to
    /// `InvalidEnvelope`.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| RelayError::InvalidEnvelope(e.to_string()))?;
        let message_type = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| RelayError::InvalidEnvelope("missing type field".to_string()))?
            .to_string();

        match message_type.as_str() {
            "START_SESSION" | "TRANSCRIPTION" | "END_SESSION" => serde_json::from_value(value)
                .map_err(|e| RelayError::InvalidEnvelope(e.to_string())),
            _ => Err(RelayError::UnknownMessageType(message_type)),
        }
    }
}

/// Envelope sent by the relay to connected clients, either as a direct reply
/// or as a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEnvelope {
    #[serde(rename = "SESSION_STARTED", rename_all = "camelCase")]
    SessionStarted {
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        platform: Option<String>,
    },
    #[serde(rename = "AI_RESPONSE")]
    AiResponse { suggestions: Vec<Suggestion> },
    #[serde(rename = "CREDENTIALS_STATUS")]
    CredentialsStatus { status: String },
    #[serde(rename = "ERROR")]
    Error { error: String },
}

impl ServerEnvelope {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!("{{\"type\":\"ERROR\",\"error\":\"encode failure: {e}\"}}")
        })
    }
}
