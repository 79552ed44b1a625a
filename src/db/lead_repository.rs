use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::Lead;

const LEAD_COLUMNS: &str = "id, name, email, phone, fitness_level, main_goal, timeline, budget, \
                            wants_trial, trial_date, trial_time, created_at";

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Lead>, AppError> {
        sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch all leads: {e}");
            AppError::db_query("Failed to fetch leads", e)
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Lead>, AppError> {
        sqlx::query_as::<_, Lead>(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to find lead {id}: {e}");
                AppError::db_query(format!("Failed to find lead {id}"), e)
            })
    }

    pub async fn save(&self, lead: &Lead) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(&format!(
            "INSERT INTO leads ({LEAD_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {LEAD_COLUMNS}"
        ))
        .bind(&lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.fitness_level)
        .bind(&lead.main_goal)
        .bind(&lead.timeline)
        .bind(&lead.budget)
        .bind(&lead.wants_trial)
        .bind(&lead.trial_date)
        .bind(&lead.trial_time)
        .bind(lead.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save lead {}: {e}", lead.id);
            AppError::db_query("Failed to save lead", e)
        })
    }
}
