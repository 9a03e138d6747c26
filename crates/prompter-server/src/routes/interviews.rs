use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::state::AppState;
use crate::storage::{InterviewRecord, NewInterview};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(save_interview))
}

/// Persist a finished interview transcript with its recorded responses.
async fn save_interview(
    State(state): State<AppState>,
    Json(body): Json<NewInterview>,
) -> Result<(StatusCode, Json<InterviewRecord>), StatusCode> {
    if body.transcript.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let record = state.storage.save_interview(body).await;
    Ok((StatusCode::CREATED, Json(record)))
}
