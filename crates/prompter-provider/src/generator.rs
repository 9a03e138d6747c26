use prompter_schema::{GenerateOptions, RelayError, ResponseStyle, Suggestion};
use serde::Deserialize;

use crate::{LlmRequest, ProviderRegistry};

const DEFAULT_MAX_TOKENS: u32 = 500;

/// Bridges question text to whichever backend the request selects.
///
/// Failures never carry provider internals to the caller beyond the message:
/// everything surfaces as `GenerationFailed` so the relay can report it
/// without tearing down the session.
pub struct SuggestionGenerator {
    registry: ProviderRegistry,
}

impl SuggestionGenerator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub async fn generate(
        &self,
        question: &str,
        options: &GenerateOptions,
    ) -> Result<Vec<Suggestion>, RelayError> {
        let entry = self
            .registry
            .get(&options.provider)
            .map_err(|e| RelayError::GenerationFailed(e.to_string()))?;

        let request = LlmRequest {
            model: entry.model.clone(),
            system: Some(build_system_prompt(options)),
            prompt: question.to_string(),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: options.temperature,
        };

        let response = entry
            .provider
            .chat(request)
            .await
            .map_err(|e| RelayError::GenerationFailed(e.to_string()))?;

        Ok(parse_suggestions(&response.text))
    }
}

fn build_system_prompt(options: &GenerateOptions) -> String {
    let style = match options.response_style {
        ResponseStyle::Concise => "concise",
        ResponseStyle::Detailed => "detailed",
    };
    let mut prompt = format!(
        "You are an interview assistant helping candidates respond to interview questions. \
         Generate {style} responses that are professional and honest. \
         Reply with a JSON array where each entry has two fields: \
         \"text\" (the suggested response) and \"confidence\" \
         (a number between 0 and 1)."
    );
    if options.preparation_mode {
        prompt.push_str(
            " The candidate is preparing ahead of the interview, so favor answers they can rehearse.",
        );
    }
    prompt
}

#[derive(Deserialize)]
struct RawSuggestion {
    text: String,
    confidence: f64,
}

/// Parse a model reply into suggestions.
///
/// Accepts a bare JSON array, or an object wrapping the array under
/// `responses`/`suggestions`. Anything else falls back to a single
/// suggestion carrying the raw text at 0.7 confidence. Confidences are
/// clamped into [0, 1].
pub fn parse_suggestions(raw: &str) -> Vec<Suggestion> {
    let array = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| match value {
            serde_json::Value::Array(_) => Some(value),
            serde_json::Value::Object(mut map) => {
                map.remove("responses").or_else(|| map.remove("suggestions"))
            }
            _ => None,
        })
        .and_then(|inner| serde_json::from_value::<Vec<RawSuggestion>>(inner).ok());

    match array {
        Some(list) => list
            .into_iter()
            .map(|s| Suggestion {
                text: s.text,
                confidence: s.confidence.clamp(0.0, 1.0),
            })
            .collect(),
        None => vec![Suggestion {
            text: raw.trim().to_string(),
            confidence: 0.7,
        }],
    }
}
