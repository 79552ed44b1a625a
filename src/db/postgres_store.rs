use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use super::event_repository::EventRepository;
use super::lead_repository::LeadRepository;
use super::Storage;
use crate::analytics::EventCounts;
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, Lead, NewAnalyticsEvent, NewLead};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    leads: LeadRepository,
    events: EventRepository,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { leads: LeadRepository::new(pool.clone()), events: EventRepository::new(pool) }
    }

    /// Opens a pool and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(AppError::DatabaseConnectionFailed)?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(AppError::MigrationFailed)?;

        info!("Database connection established and migrations applied");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Storage for PostgresStore {
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, AppError> {
        self.leads.save(&Lead::new(lead)).await
    }

    async fn get_all_leads(&self) -> Result<Vec<Lead>, AppError> {
        self.leads.find_all().await
    }

    async fn get_lead_by_id(&self, id: &str) -> Result<Option<Lead>, AppError> {
        self.leads.find_by_id(id).await
    }

    async fn track_event(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AppError> {
        self.events.save(&AnalyticsEvent::new(event)).await
    }

    async fn count_events(&self) -> Result<EventCounts, AppError> {
        self.events.count_by_type().await
    }
}
