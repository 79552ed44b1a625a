use sqlx::PgPool;
use tracing::{error, warn};

use crate::analytics::EventCounts;
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, EventType};

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, event: &AnalyticsEvent) -> Result<AnalyticsEvent, AppError> {
        sqlx::query(
            "INSERT INTO analytics_events (id, event_type, session_id, step_reached, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&event.id)
        .bind(event.event_type.as_str())
        .bind(&event.session_id)
        .bind(&event.step_reached)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save analytics event {}: {e}", event.id);
            AppError::db_query("Failed to save analytics event", e)
        })?;
        Ok(event.clone())
    }

    /// Totals per event kind, computed by the database at call time.
    pub async fn count_by_type(&self) -> Result<EventCounts, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT event_type, COUNT(*) FROM analytics_events GROUP BY event_type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to count analytics events: {e}");
            AppError::db_query("Failed to count analytics events", e)
        })?;

        let mut counts = EventCounts::default();
        for (event_type, count) in rows {
            match EventType::try_from(event_type.as_str()) {
                Ok(kind) => counts.add(kind, count.max(0) as u64),
                Err(e) => warn!("Ignoring {count} stored events: {e}"),
            }
        }
        Ok(counts)
    }
}
