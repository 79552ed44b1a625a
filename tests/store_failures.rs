//! Behaviour over a store that is down: generic 500s with nothing leaked,
//! and a conversation that reports the failed save instead of losing it.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, body_text, build_failing_app, get, post_empty, post_json, valid_lead,
    STORE_FAILURE_DETAIL,
};
use serde_json::json;

async fn assert_generic_500(response: axum::response::Response, message: &str) {
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(!body.contains(STORE_FAILURE_DETAIL), "store detail leaked: {body}");
    assert!(!body.contains("Database"), "store detail leaked: {body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, json!({ "error": message }));
}

#[tokio::test]
async fn create_lead_is_a_generic_500() {
    let response = post_json(build_failing_app(), "/api/leads", valid_lead()).await;
    assert_generic_500(response, "Failed to create lead").await;
}

#[tokio::test]
async fn validation_still_runs_before_the_store() {
    let mut body = valid_lead();
    body["email"] = json!("nope");
    let response = post_json(build_failing_app(), "/api/leads", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reads_are_generic_500s() {
    let app = build_failing_app();
    assert_generic_500(get(app.clone(), "/api/leads").await, "Failed to fetch leads").await;
    assert_generic_500(get(app.clone(), "/api/leads/abc").await, "Failed to fetch lead").await;
    assert_generic_500(get(app.clone(), "/api/leads/export").await, "Failed to export leads")
        .await;
    assert_generic_500(
        get(app.clone(), "/api/analytics/stats").await,
        "Failed to fetch analytics stats",
    )
    .await;
    assert_generic_500(get(app, "/api/analytics/funnel").await, "Failed to fetch analytics funnel")
        .await;
}

#[tokio::test]
async fn track_is_a_generic_500() {
    let response = post_json(
        build_failing_app(),
        "/api/analytics/track",
        json!({ "eventType": "widget_open" }),
    )
    .await;
    assert_generic_500(response, "Failed to track event").await;
}

#[tokio::test]
async fn session_reports_a_failed_save_and_stays_retryable() {
    let app = build_failing_app();
    let id = body_json(post_empty(app.clone(), "/api/sessions").await).await["id"]
        .as_str()
        .unwrap()
        .to_owned();
    let uri = format!("/api/sessions/{id}/advance");
    for input in [
        json!({ "type": "choice", "key": "weight_loss" }),
        json!({ "type": "choice", "key": "beginner" }),
        json!({ "type": "text", "text": "Lose 20 lbs" }),
        json!({ "type": "choice", "key": "this_week" }),
        json!({ "type": "choice", "key": "$100-200" }),
        json!({ "type": "contact", "name": "Jane Doe", "email": "jane@example.com", "phone": "5551234567" }),
    ] {
        assert_eq!(post_json(app.clone(), &uri, input).await.status(), StatusCode::OK);
    }

    let response = post_json(app.clone(), &uri, json!({ "type": "trial_choice", "wantsTrial": false })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["step"], "confirmation");
    assert_eq!(view["leadSaved"], false);
    assert_eq!(view["saveError"], "Failed to save your information. Please try again.");

    let retry = body_json(post_empty(app, &format!("/api/sessions/{id}/submit")).await).await;
    assert_eq!(retry["leadSaved"], false);
    assert!(retry["saveError"].is_string());
}
