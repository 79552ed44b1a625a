use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::{bad_body, error_response};
use crate::flow::UserInput;
use crate::AppState;

/// POST `/api/sessions`: open a conversation at the greeting
pub async fn start_session_handler(State(state): State<AppState>) -> Response {
    (StatusCode::CREATED, Json(state.sessions.start().await)).into_response()
}

/// GET `/api/sessions/{id}`
pub async fn get_session_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.sessions.get(&id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response("Failed to load session", &e),
    }
}

/// POST `/api/sessions/{id}/advance`: apply one visitor answer
pub async fn advance_session_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<UserInput>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    match state.sessions.advance(&id, input).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response("Failed to advance session", &e),
    }
}

/// POST `/api/sessions/{id}/submit`: retry a lead save that failed
pub async fn retry_submission_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.sessions.retry_submission(&id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response("Failed to submit lead", &e),
    }
}
