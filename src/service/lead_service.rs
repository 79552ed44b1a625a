use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};
use validator::Validate;

use crate::db::Storage;
use crate::errors::AppError;
use crate::models::{Lead, NewLead};
use crate::notify::LeadNotifier;

pub const CSV_HEADERS: [&str; 11] = [
    "Name",
    "Email",
    "Phone",
    "Fitness Level",
    "Goal",
    "Timeline",
    "Budget",
    "Wants Trial",
    "Trial Date",
    "Trial Time",
    "Created At",
];

#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn Storage>,
    notifier: Arc<dyn LeadNotifier>,
    notifications_enabled: bool,
}

impl LeadService {
    pub fn new(
        store: Arc<dyn Storage>,
        notifier: Arc<dyn LeadNotifier>,
        notifications_enabled: bool,
    ) -> Self {
        Self { store, notifier, notifications_enabled }
    }

    /// Validates and persists a lead, then hands the staff notification to a
    /// detached task. The returned lead never waits on that task.
    pub async fn create_lead(&self, fields: NewLead) -> Result<Lead, AppError> {
        fields.validate()?;
        let lead = self.store.create_lead(fields).await?;
        info!(lead_id = %lead.id, wants_trial = %lead.wants_trial, "Lead captured");
        self.notify_detached(&lead);
        Ok(lead)
    }

    /// Spawns the notification; failures are logged and go nowhere else.
    pub fn notify_detached(&self, lead: &Lead) -> Option<JoinHandle<()>> {
        if !self.notifications_enabled {
            return None;
        }
        let notifier = self.notifier.clone();
        let lead = lead.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = notifier.notify_new_lead(&lead).await {
                error!(lead_id = %lead.id, "Lead notification failed (non-blocking): {e}");
            }
        }))
    }

    pub async fn list_leads(&self) -> Result<Vec<Lead>, AppError> {
        self.store.get_all_leads().await
    }

    pub async fn get_lead(&self, id: &str) -> Result<Lead, AppError> {
        self.store.get_lead_by_id(id).await?.ok_or_else(|| AppError::RecordNotFound {
            entity_type: "Lead".to_string(),
            id: id.to_string(),
        })
    }

    pub async fn export_csv(&self) -> Result<String, AppError> {
        Ok(leads_to_csv(&self.list_leads().await?))
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Header line plus one line per lead, every field double-quoted.
pub fn leads_to_csv(leads: &[Lead]) -> String {
    let mut lines = Vec::with_capacity(leads.len() + 1);
    lines.push(CSV_HEADERS.iter().map(|h| quote(h)).collect::<Vec<_>>().join(","));
    for lead in leads {
        let created = lead.created_at.format("%Y-%m-%d").to_string();
        let row = [
            lead.name.as_str(),
            lead.email.as_str(),
            lead.phone.as_str(),
            lead.fitness_level.as_str(),
            lead.main_goal.as_str(),
            lead.timeline.as_str(),
            lead.budget.as_str(),
            lead.wants_trial.as_str(),
            lead.trial_date.as_deref().unwrap_or_default(),
            lead.trial_time.as_deref().unwrap_or_default(),
            created.as_str(),
        ];
        lines.push(row.iter().map(|f| quote(f)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}
