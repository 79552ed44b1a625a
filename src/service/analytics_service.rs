use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::analytics::{AnalyticsStats, FunnelStage};
use crate::db::Storage;
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, NewAnalyticsEvent, TrackEventRequest};

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn Storage>,
    enabled: bool,
}

impl AnalyticsService {
    /// `enabled` gates only the events the server emits on its own; events
    /// posted by the widget are always recorded.
    pub fn new(store: Arc<dyn Storage>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub async fn track(&self, request: TrackEventRequest) -> Result<AnalyticsEvent, AppError> {
        let event_type = request.event_type.clone();
        let event = NewAnalyticsEvent::try_from(request)
            .map_err(|_| AppError::InvalidEventType { event_type })?;
        self.store.track_event(event).await
    }

    /// Records an event on a detached task. Failures are logged only.
    pub fn track_detached(&self, event: NewAnalyticsEvent) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }
        let store = self.store.clone();
        Some(tokio::spawn(async move {
            let kind = event.event_type;
            match store.track_event(event).await {
                Ok(saved) => debug!(event_id = %saved.id, %kind, "Tracked analytics event"),
                Err(e) => error!(%kind, "Analytics tracking failed (non-blocking): {e}"),
            }
        }))
    }

    pub async fn stats(&self) -> Result<AnalyticsStats, AppError> {
        self.store.get_analytics_stats().await
    }

    pub async fn funnel(&self) -> Result<Vec<FunnelStage>, AppError> {
        Ok(self.stats().await?.funnel())
    }
}
