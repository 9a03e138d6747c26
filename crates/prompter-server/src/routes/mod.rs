pub mod interviews;
pub mod platform;
pub mod suggestions;
pub mod users;
pub mod ws;

use axum::http::StatusCode;
use axum::{Json, Router};
use prompter_schema::RelayError;
use serde::Serialize;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/suggestions", suggestions::router())
        .nest("/platform", platform::router())
        .nest("/users", users::router())
        .nest("/interviews", interviews::router())
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn error_response(err: RelayError) -> (StatusCode, Json<ErrorBody>) {
    let status = match &err {
        RelayError::MissingConfiguration(_)
        | RelayError::UnsupportedPlatform(_)
        | RelayError::UnknownMessageType(_)
        | RelayError::InvalidEnvelope(_) => StatusCode::BAD_REQUEST,
        RelayError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        RelayError::DuplicateSession(_) => StatusCode::CONFLICT,
        RelayError::GenerationFailed(_)
        | RelayError::ConnectionFailed(_)
        | RelayError::DeliveryFailed(_)
        | RelayError::ListenFailed { .. }
        | RelayError::PlatformIntegrationFailed(_) => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        let (status, _) = error_response(RelayError::SessionNotFound("x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(RelayError::UnsupportedPlatform("webex".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = error_response(RelayError::GenerationFailed("backend down".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("backend down"));
    }
}
