pub mod event_repository;
pub mod lead_repository;
pub mod memory_store;
pub mod postgres_store;

use async_trait::async_trait;

use crate::analytics::{AnalyticsStats, EventCounts};
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, Lead, NewAnalyticsEvent, NewLead};

pub use memory_store::MemoryStore;
pub use postgres_store::PostgresStore;

/// Persistence for leads and analytics events.
///
/// Chosen once at startup and shared as `Arc<dyn Storage>`. Every write is a
/// single-row insert; nothing here needs a multi-row transaction.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Assigns an id and creation time and persists the lead.
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, AppError>;

    /// All leads, newest first.
    async fn get_all_leads(&self) -> Result<Vec<Lead>, AppError>;

    async fn get_lead_by_id(&self, id: &str) -> Result<Option<Lead>, AppError>;

    async fn track_event(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AppError>;

    async fn count_events(&self) -> Result<EventCounts, AppError>;

    async fn get_analytics_stats(&self) -> Result<AnalyticsStats, AppError> {
        Ok(AnalyticsStats::from(self.count_events().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_is_object_safe() {
        fn _accepts_dyn(_store: &dyn Storage) {}
    }
}
