pub mod api_routes;
pub mod chat_routes;
pub mod session_routes;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::errors::AppError;

/// Maps an [`AppError`] onto the API's JSON error shape. `failure` is the
/// generic message shown for store and internal failures; their detail only
/// goes to the log.
pub(crate) fn error_response(failure: &str, err: &AppError) -> Response {
    match err {
        AppError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Validation failed", "details": errors })),
        )
            .into_response(),
        AppError::InvalidEventType { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid event data", "details": err.to_string() })),
        )
            .into_response(),
        e if e.is_validation() => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
        e if e.is_not_found() => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response()
        }
        e if e.is_unreachable_transition() => {
            (StatusCode::CONFLICT, Json(json!({ "error": e.to_string() }))).into_response()
        }
        e => {
            error!("{failure}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": failure }))).into_response()
        }
    }
}

pub(crate) fn bad_body(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request body", "details": rejection.body_text() })),
    )
        .into_response()
}
