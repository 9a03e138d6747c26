use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::state::AppState;
use crate::storage::{NewUser, User};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/{id}", get(get_user))
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    if body.username.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if state
        .storage
        .get_user_by_username(&body.username)
        .await
        .is_some()
    {
        return Err(StatusCode::CONFLICT);
    }

    let user = state.storage.create_user(body).await;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<User>, StatusCode> {
    state
        .storage
        .get_user(id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
