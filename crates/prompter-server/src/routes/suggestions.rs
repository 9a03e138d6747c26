use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use prompter_schema::{GenerateOptions, Suggestion};
use serde::{Deserialize, Serialize};

use super::{error_response, ErrorBody};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SuggestionsRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<GenerateOptions>,
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(generate))
}

/// Direct synchronous path to the generator, bypassing the session relay.
async fn generate(
    State(state): State<AppState>,
    Json(body): Json<SuggestionsRequest>,
) -> Result<Json<SuggestionsResponse>, (StatusCode, Json<ErrorBody>)> {
    let Some(question) = body.question.filter(|q| !q.is_empty()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "question is required".to_string(),
            }),
        ));
    };

    // The direct path defaults to openai; options sent by the client pass
    // through unchanged.
    let options = body.options.unwrap_or_else(|| GenerateOptions {
        provider: "openai".to_string(),
        ..GenerateOptions::default()
    });

    let suggestions = state
        .relay
        .generator()
        .generate(&question, &options)
        .await
        .map_err(error_response)?;

    Ok(Json(SuggestionsResponse { suggestions }))
}
