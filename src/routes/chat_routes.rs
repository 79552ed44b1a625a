use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream::{self, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;

use super::bad_body;
use crate::models::{AnswerResponse, QuestionRequest};
use crate::AppState;

fn question_or_400(body: Result<Json<QuestionRequest>, JsonRejection>) -> Result<String, Response> {
    let Json(request) = body.map_err(bad_body)?;
    match request.question {
        Some(q) if !q.trim().is_empty() => Ok(q),
        _ => Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Question is required" })))
            .into_response()),
    }
}

/// POST `/api/chat`: one-shot answer from the assistant
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<QuestionRequest>, JsonRejection>,
) -> Response {
    let question = match question_or_400(body) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let answer = state.agent.answer(&question).await;
    Json(AnswerResponse { answer }).into_response()
}

/// POST `/api/chat/stream`: the answer as server-sent events.
///
/// Protocol:
/// - `data: {"content": "..."}` (repeated)
/// - `data: [DONE]`
pub async fn chat_stream_handler(
    State(state): State<AppState>,
    body: Result<Json<QuestionRequest>, JsonRejection>,
) -> Response {
    let question = match question_or_400(body) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    let (tx, rx) = mpsc::channel::<String>(16);
    let agent = state.agent.clone();
    tokio::spawn(async move { agent.stream_answer(&question, tx).await });

    let chunks = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    })
    .map(|chunk| {
        Ok::<_, Infallible>(Event::default().data(json!({ "content": chunk }).to_string()))
    });
    let done = stream::once(async { Ok::<_, Infallible>(Event::default().data("[DONE]")) });

    Sse::new(chunks.chain(done)).keep_alive(KeepAlive::default()).into_response()
}
