#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use async_trait::async_trait;

use lead_qualifier::agent::AdvisorAgent;
use lead_qualifier::analytics::EventCounts;
use lead_qualifier::db::{MemoryStore, Storage};
use lead_qualifier::errors::AppError;
use lead_qualifier::models::{AnalyticsEvent, Lead, NewAnalyticsEvent, NewLead};
use lead_qualifier::flow::BrandConfig;
use lead_qualifier::notify::LogOnlyNotifier;
use lead_qualifier::service::session_service::DEFAULT_IDLE_TTL;
use lead_qualifier::{build_router, AppState};

/// Full router over a fresh in-memory store, with mail logged and the
/// assistant disabled. Mirrors the wiring in `main.rs`.
pub fn build_test_app() -> Router {
    build_test_app_with(BrandConfig::default())
}

pub fn build_test_app_with(brand: BrandConfig) -> Router {
    build_test_app_over(Arc::new(MemoryStore::default()), brand)
}

/// Same router over a store whose every call fails like a dropped database.
pub fn build_failing_app() -> Router {
    build_test_app_over(Arc::new(UnreachableStore), BrandConfig::default())
}

pub fn build_test_app_over(store: Arc<dyn Storage>, brand: BrandConfig) -> Router {
    let agent = AdvisorAgent::disabled(&brand.name);
    let state = AppState::new(
        store,
        Arc::new(LogOnlyNotifier),
        agent,
        brand,
        DEFAULT_IDLE_TTL,
    );
    build_router(state)
}

/// Detail that must stay in the server log and never reach a response body.
pub const STORE_FAILURE_DETAIL: &str = "connection to 10.0.0.5:5432 refused";

pub struct UnreachableStore;

fn store_down() -> AppError {
    AppError::db_query(STORE_FAILURE_DETAIL, sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl Storage for UnreachableStore {
    async fn create_lead(&self, _lead: NewLead) -> Result<Lead, AppError> {
        Err(store_down())
    }

    async fn get_all_leads(&self) -> Result<Vec<Lead>, AppError> {
        Err(store_down())
    }

    async fn get_lead_by_id(&self, _id: &str) -> Result<Option<Lead>, AppError> {
        Err(store_down())
    }

    async fn track_event(&self, _event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AppError> {
        Err(store_down())
    }

    async fn count_events(&self) -> Result<EventCounts, AppError> {
        Err(store_down())
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder().method(Method::POST).uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub fn valid_lead() -> Value {
    serde_json::json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "phone": "5551234567",
        "fitnessLevel": "Beginner",
        "mainGoal": "Lose 20 lbs",
        "timeline": "This week",
        "budget": "$100-200",
        "wantsTrial": "no"
    })
}
