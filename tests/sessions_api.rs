//! End-to-end conversation over HTTP: the widget drives a session from the
//! greeting to confirmation and the lead lands in the store.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, build_test_app, build_test_app_with, get, post_empty, post_json};
use lead_qualifier::flow::BrandConfig;
use serde_json::{json, Value};

async fn advance(app: &Router, id: &str, input: Value) -> Value {
    let response = post_json(app.clone(), &format!("/api/sessions/{id}/advance"), input).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn start(app: &Router) -> String {
    let response = post_empty(app.clone(), "/api/sessions").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let view = body_json(response).await;
    assert_eq!(view["step"], "greeting");
    assert_eq!(view["messages"].as_array().unwrap().len(), 1);
    view["id"].as_str().unwrap().to_owned()
}

async fn answer_through_contact(app: &Router, id: &str) -> Value {
    advance(app, id, json!({ "type": "choice", "key": "weight_loss" })).await;
    advance(app, id, json!({ "type": "choice", "key": "beginner" })).await;
    advance(app, id, json!({ "type": "text", "text": "Lose 20 lbs" })).await;
    advance(app, id, json!({ "type": "choice", "key": "this_week" })).await;
    advance(app, id, json!({ "type": "choice", "key": "$100-200" })).await;
    advance(
        app,
        id,
        json!({ "type": "contact", "name": "Jane Doe", "email": "jane@example.com", "phone": "5551234567" }),
    )
    .await
}

/// Detached analytics writes settle shortly after the response.
async fn settled_stats(app: &Router, done: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..200 {
        let stats = body_json(get(app.clone(), "/api/analytics/stats").await).await;
        if done(&stats) {
            return stats;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    body_json(get(app.clone(), "/api/analytics/stats").await).await
}

#[tokio::test]
async fn decline_path_stores_one_lead() {
    let app = build_test_app();
    let id = start(&app).await;

    let at_trial = answer_through_contact(&app, &id).await;
    assert_eq!(at_trial["step"], "trial_booking");
    assert_eq!(at_trial["expectedInput"]["type"], "trial_choice");

    let done = advance(&app, &id, json!({ "type": "trial_choice", "wantsTrial": false })).await;
    assert_eq!(done["step"], "confirmation");
    assert_eq!(done["leadSaved"], true);
    assert_eq!(done["progress"], 4);
    assert_eq!(done["expectedInput"]["type"], "done");

    let messages = done["messages"].as_array().unwrap();
    let users = messages.iter().filter(|m| m["role"] == "user").count();
    let bots = messages.iter().filter(|m| m["role"] == "bot").count();
    assert_eq!((users, bots), (7, 8));

    let leads = body_json(get(app.clone(), "/api/leads").await).await;
    let leads = leads.as_array().unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0]["name"], "Jane Doe");
    assert_eq!(leads[0]["fitnessLevel"], "beginner");
    assert_eq!(leads[0]["wantsTrial"], "no");

    let stats = settled_stats(&app, |s| s["totalConversationCompletes"] == 1).await;
    assert_eq!(stats["totalConversationStarts"], 1);
    assert_eq!(stats["totalConversationCompletes"], 1);
    assert_eq!(stats["totalTrialsBooked"], 0);
}

#[tokio::test]
async fn booking_path_records_the_slot() {
    let app = build_test_app();
    let id = start(&app).await;
    answer_through_contact(&app, &id).await;

    let asking = advance(&app, &id, json!({ "type": "trial_choice", "wantsTrial": true })).await;
    assert_eq!(asking["step"], "trial_booking");
    assert_eq!(asking["expectedInput"]["type"], "trial_slot");

    let done = advance(
        &app,
        &id,
        json!({ "type": "trial_slot", "date": "Monday, March 3", "time": "9:00 AM" }),
    )
    .await;
    assert_eq!(done["step"], "confirmation");

    let leads = body_json(get(app.clone(), "/api/leads").await).await;
    assert_eq!(leads[0]["wantsTrial"], "yes");
    assert_eq!(leads[0]["trialDate"], "Monday, March 3");
    assert_eq!(leads[0]["trialTime"], "9:00 AM");

    let stats = settled_stats(&app, |s| s["totalTrialsBooked"] == 1).await;
    assert_eq!(stats["totalTrialsBooked"], 1);
}

#[tokio::test]
async fn trial_booking_can_be_switched_off() {
    let mut brand = BrandConfig::default();
    brand.features.enable_trial_booking = false;
    let app = build_test_app_with(brand);
    let id = start(&app).await;

    let done = answer_through_contact(&app, &id).await;
    assert_eq!(done["step"], "confirmation");
    assert_eq!(done["leadSaved"], true);

    let leads = body_json(get(app, "/api/leads").await).await;
    assert_eq!(leads[0]["wantsTrial"], "no");
}

#[tokio::test]
async fn out_of_order_input_is_a_conflict() {
    let app = build_test_app();
    let id = start(&app).await;
    let response = post_json(
        app.clone(),
        &format!("/api/sessions/{id}/advance"),
        json!({ "type": "trial_slot", "date": "Mon", "time": "9:00 AM" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("does not accept trial_slot input"));

    let view = body_json(get(app, &format!("/api/sessions/{id}")).await).await;
    assert_eq!(view["step"], "greeting");
}

#[tokio::test]
async fn input_after_confirmation_is_a_conflict() {
    let app = build_test_app();
    let id = start(&app).await;
    answer_through_contact(&app, &id).await;
    advance(&app, &id, json!({ "type": "trial_choice", "wantsTrial": false })).await;

    let response = post_json(
        app.clone(),
        &format!("/api/sessions/{id}/advance"),
        json!({ "type": "choice", "key": "weight_loss" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let leads = body_json(get(app, "/api/leads").await).await;
    assert_eq!(leads.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_choice_key_is_rejected_without_moving() {
    let app = build_test_app();
    let id = start(&app).await;
    advance(&app, &id, json!({ "type": "choice", "key": "weight_loss" })).await;
    advance(&app, &id, json!({ "type": "choice", "key": "beginner" })).await;
    advance(&app, &id, json!({ "type": "text", "text": "Lose 20 lbs" })).await;
    let at_budget = advance(&app, &id, json!({ "type": "choice", "key": "this_week" })).await;
    let transcript_len = at_budget["messages"].as_array().unwrap().len();

    let response = post_json(
        app.clone(),
        &format!("/api/sessions/{id}/advance"),
        json!({ "type": "choice", "key": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let view = body_json(get(app.clone(), &format!("/api/sessions/{id}")).await).await;
    assert_eq!(view["step"], "budget");
    assert_eq!(view["messages"].as_array().unwrap().len(), transcript_len);
    assert!(view["leadData"].get("budget").is_none());

    // A real answer afterwards still ends in a stored lead.
    advance(&app, &id, json!({ "type": "choice", "key": "$100-200" })).await;
    answer_contact_and_decline(&app, &id).await;
    let leads = body_json(get(app, "/api/leads").await).await;
    assert_eq!(leads[0]["budget"], "$100-200");
}

async fn answer_contact_and_decline(app: &Router, id: &str) {
    advance(
        app,
        id,
        json!({ "type": "contact", "name": "Jane Doe", "email": "jane@example.com", "phone": "5551234567" }),
    )
    .await;
    let done = advance(app, id, json!({ "type": "trial_choice", "wantsTrial": false })).await;
    assert_eq!(done["leadSaved"], true);
}

#[tokio::test]
async fn invalid_contact_keeps_the_session_in_place() {
    let app = build_test_app();
    let id = start(&app).await;
    advance(&app, &id, json!({ "type": "choice", "key": "weight_loss" })).await;
    advance(&app, &id, json!({ "type": "choice", "key": "beginner" })).await;
    advance(&app, &id, json!({ "type": "text", "text": "Get strong" })).await;
    advance(&app, &id, json!({ "type": "choice", "key": "this_week" })).await;
    advance(&app, &id, json!({ "type": "choice", "key": "$100-200" })).await;

    let response = post_json(
        app.clone(),
        &format!("/api/sessions/{id}/advance"),
        json!({ "type": "contact", "name": "J", "email": "nope", "phone": "1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Validation failed");

    let view = body_json(get(app, &format!("/api/sessions/{id}")).await).await;
    assert_eq!(view["step"], "contact_info");
}

#[tokio::test]
async fn unknown_session_is_404() {
    let app = build_test_app();
    assert_eq!(get(app.clone(), "/api/sessions/missing").await.status(), StatusCode::NOT_FOUND);
    let response = post_empty(app, "/api/sessions/missing/submit").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_after_save_does_not_duplicate() {
    let app = build_test_app();
    let id = start(&app).await;
    answer_through_contact(&app, &id).await;
    advance(&app, &id, json!({ "type": "trial_choice", "wantsTrial": false })).await;

    let response = post_empty(app.clone(), &format!("/api/sessions/{id}/submit")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let leads = body_json(get(app, "/api/leads").await).await;
    assert_eq!(leads.as_array().unwrap().len(), 1);
}
