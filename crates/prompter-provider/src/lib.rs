pub mod gemini;
pub mod generator;
pub mod openai;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiProvider;
pub use generator::SuggestionGenerator;
pub use openai::OpenAiProvider;
pub use types::{LlmRequest, LlmResponse};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse>;

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// Provider Configuration
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Gemini,
}

/// Configuration for a single provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider ID as clients select it (e.g. "openai", "google")
    pub id: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used for this provider's requests
    #[serde(default)]
    pub model: Option<String>,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, provider_type: ProviderType) -> Self {
        Self {
            id: id.into(),
            provider_type,
            api_key: None,
            base_url: None,
            model: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Read provider configurations from the process environment.
    ///
    /// `OPENAI_API_KEY` enables the "openai" provider, `GOOGLE_CLOUD_API_KEY`
    /// the "google" provider. Either may be absent.
    pub fn from_env() -> Vec<ProviderConfig> {
        let mut configs = Vec::new();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                configs.push(ProviderConfig::new("openai", ProviderType::OpenAi).with_api_key(key));
            }
        }
        if let Ok(key) = std::env::var("GOOGLE_CLOUD_API_KEY") {
            if !key.is_empty() {
                configs.push(ProviderConfig::new("google", ProviderType::Gemini).with_api_key(key));
            }
        }
        configs
    }
}

/// Create a provider from configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider_type {
        ProviderType::OpenAi => {
            let key = config
                .api_key
                .as_ref()
                .ok_or_else(|| anyhow!("openai requires api_key"))?;
            let base_url = config
                .base_url
                .as_deref()
                .unwrap_or("https://api.openai.com/v1");
            Arc::new(OpenAiProvider::new(key.clone(), base_url))
        }
        ProviderType::Gemini => {
            let key = config
                .api_key
                .as_ref()
                .ok_or_else(|| anyhow!("gemini requires api_key"))?;
            let mut provider = GeminiProvider::new(key.clone());
            if let Some(base) = &config.base_url {
                provider = provider.with_base_url(base.clone());
            }
            Arc::new(provider)
        }
    };
    Ok(provider)
}

fn default_model(provider_type: &ProviderType) -> &'static str {
    match provider_type {
        ProviderType::OpenAi => DEFAULT_OPENAI_MODEL,
        ProviderType::Gemini => DEFAULT_GEMINI_MODEL,
    }
}

/// Register providers from a list of configurations.
pub fn register_from_configs(registry: &mut ProviderRegistry, configs: &[ProviderConfig]) -> Result<()> {
    for config in configs {
        let provider = create_provider(config)?;
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| default_model(&config.provider_type).to_string());
        registry.register(&config.id, provider, model);
        tracing::info!("registered provider: {} ({:?})", config.id, config.provider_type);
    }
    Ok(())
}

// ============================================================
// Provider Registry
// ============================================================

#[derive(Clone)]
pub struct ProviderEntry {
    pub provider: Arc<dyn LlmProvider>,
    pub model: String,
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
    ) {
        self.providers.insert(
            id.into(),
            ProviderEntry {
                provider,
                model: model.into(),
            },
        );
    }

    pub fn get(&self, id: &str) -> Result<ProviderEntry> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("provider not found: {id}"))
    }

    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Offline provider answering with two canned suggestions. Used by tests and
/// as the fallback when no API key is configured.
pub struct StubProvider;

#[async_trait]
impl LlmProvider for StubProvider {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse> {
        let text = serde_json::json!([
            {
                "text": format!("[stub:{}] {}", request.model, request.prompt),
                "confidence": 0.9
            },
            {
                "text": format!("[stub:{}] alternative take", request.model),
                "confidence": 0.6
            }
        ])
        .to_string();
        Ok(LlmResponse {
            text,
            input_tokens: None,
            output_tokens: None,
        })
    }
}

/// Register stubs under both client-facing provider ids.
pub fn register_stub_providers(registry: &mut ProviderRegistry) {
    registry.register("openai", Arc::new(StubProvider), "stub");
    registry.register("google", Arc::new(StubProvider), "stub");
}
