use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use prompter_platforms::create_platform_integration;
use prompter_schema::PlatformConfig;
use serde::{Deserialize, Serialize};

use super::{error_response, ErrorBody};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CheckRequirementsRequest {
    pub platform: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequirementsResponse {
    pub requires_credentials: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub platform: String,
    #[serde(default)]
    pub config: PlatformConfig,
    pub session_id: String,
}

#[derive(Serialize)]
pub struct ConnectResponse {
    pub status: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-requirements", post(check_requirements))
        .route("/connect", post(connect))
}

/// Capability probe: builds an unconnected integration and reports whether
/// the platform needs client credentials.
async fn check_requirements(
    Json(body): Json<CheckRequirementsRequest>,
) -> Result<Json<CheckRequirementsResponse>, (StatusCode, Json<ErrorBody>)> {
    let integration = create_platform_integration(&body.platform, &PlatformConfig::default())
        .await
        .map_err(error_response)?;

    Ok(Json(CheckRequirementsResponse {
        requires_credentials: integration.requires_credentials(),
    }))
}

async fn connect(
    State(state): State<AppState>,
    Json(body): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, (StatusCode, Json<ErrorBody>)> {
    if body.config.meeting_link.is_none() || body.session_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "missing required connection parameters".to_string(),
            }),
        ));
    }

    state
        .relay
        .connect_platform(&body.platform, body.session_id, &body.config)
        .await
        .map_err(error_response)?;

    Ok(Json(ConnectResponse {
        status: "connected".to_string(),
    }))
}
