pub mod agent;
pub mod analytics;
pub mod config;
pub mod db;
pub mod errors;
pub mod flow;
pub mod models;
pub mod notify;
pub mod routes;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent::AdvisorAgent;
use crate::db::Storage;
use crate::flow::copy::BrandConfig;
use crate::flow::Flow;
use crate::notify::LeadNotifier;
use crate::routes::api_routes::{
    create_lead_handler, export_leads_handler, funnel_handler, get_lead_handler,
    list_leads_handler, stats_handler, track_event_handler,
};
use crate::routes::chat_routes::{chat_handler, chat_stream_handler};
use crate::routes::session_routes::{
    advance_session_handler, get_session_handler, retry_submission_handler,
    start_session_handler,
};
use crate::service::analytics_service::AnalyticsService;
use crate::service::lead_service::LeadService;
use crate::service::session_service::SessionService;

/// Everything the handlers reach through `State`. The store is chosen once at
/// startup and shared by every service.
#[derive(Clone)]
pub struct AppState {
    pub leads: LeadService,
    pub analytics: AnalyticsService,
    pub sessions: SessionService,
    pub agent: AdvisorAgent,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Storage>,
        notifier: Arc<dyn LeadNotifier>,
        agent: AdvisorAgent,
        brand: BrandConfig,
        session_idle_ttl: Duration,
    ) -> Self {
        let notifications = brand.features.enable_email_notifications;
        let tracking = brand.features.enable_analytics;

        let leads = LeadService::new(store.clone(), notifier, notifications);
        let analytics = AnalyticsService::new(store, tracking);
        let sessions =
            SessionService::new(Flow::new(Arc::new(brand)), leads.clone(), analytics.clone())
                .with_idle_ttl(session_idle_ttl);

        Self { leads, analytics, sessions, agent }
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    // The widget is embedded on third-party sites.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        // Leads
        .route("/api/leads", post(create_lead_handler).get(list_leads_handler))
        .route("/api/leads/export", get(export_leads_handler))
        .route("/api/leads/{id}", get(get_lead_handler))
        // Analytics
        .route("/api/analytics/track", post(track_event_handler))
        .route("/api/analytics/stats", get(stats_handler))
        .route("/api/analytics/funnel", get(funnel_handler))
        // Conversation sessions
        .route("/api/sessions", post(start_session_handler))
        .route("/api/sessions/{id}", get(get_session_handler))
        .route("/api/sessions/{id}/advance", post(advance_session_handler))
        .route("/api/sessions/{id}/submit", post(retry_submission_handler))
        // Assistant
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(chat_stream_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
