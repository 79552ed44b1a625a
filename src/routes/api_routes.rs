use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use super::{bad_body, error_response};
use crate::models::{NewLead, TrackEventRequest};
use crate::AppState;

// ── Leads ────────────────────────────────────────────────────────────────────

/// POST `/api/leads`: validate and persist a lead; staff mail goes out detached
pub async fn create_lead_handler(
    State(state): State<AppState>,
    body: Result<Json<NewLead>, JsonRejection>,
) -> Response {
    let Json(fields) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    match state.leads.create_lead(fields).await {
        Ok(lead) => (StatusCode::CREATED, Json(lead)).into_response(),
        Err(e) => error_response("Failed to create lead", &e),
    }
}

/// GET `/api/leads`: all leads, newest first
pub async fn list_leads_handler(State(state): State<AppState>) -> Response {
    match state.leads.list_leads().await {
        Ok(leads) => Json(leads).into_response(),
        Err(e) => error_response("Failed to fetch leads", &e),
    }
}

/// GET `/api/leads/{id}`
pub async fn get_lead_handler(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    match state.leads.get_lead(&id).await {
        Ok(lead) => Json(lead).into_response(),
        Err(e) => error_response("Failed to fetch lead", &e),
    }
}

/// GET `/api/leads/export`: CSV download
pub async fn export_leads_handler(State(state): State<AppState>) -> Response {
    match state.leads.export_csv().await {
        Ok(csv) => {
            let disposition =
                format!("attachment; filename=\"leads-{}.csv\"", Utc::now().format("%Y-%m-%d"));
            (
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv,
            )
                .into_response()
        }
        Err(e) => error_response("Failed to export leads", &e),
    }
}

// ── Analytics ────────────────────────────────────────────────────────────────

/// POST `/api/analytics/track`
pub async fn track_event_handler(
    State(state): State<AppState>,
    body: Result<Json<TrackEventRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    match state.analytics.track(request).await {
        Ok(event) => Json(event).into_response(),
        Err(e) => error_response("Failed to track event", &e),
    }
}

/// GET `/api/analytics/stats`
pub async fn stats_handler(State(state): State<AppState>) -> Response {
    match state.analytics.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => error_response("Failed to fetch analytics stats", &e),
    }
}

/// GET `/api/analytics/funnel`: per-stage bars for the dashboard
pub async fn funnel_handler(State(state): State<AppState>) -> Response {
    match state.analytics.funnel().await {
        Ok(funnel) => Json(funnel).into_response(),
        Err(e) => error_response("Failed to fetch analytics funnel", &e),
    }
}
