//! Staff notification when a lead is captured.
//!
//! Delivery is always best effort: callers spawn it and only log failures.

pub mod email;

use async_trait::async_trait;
use tracing::info;

use crate::models::Lead;

pub use email::{EmailError, SmtpNotifier};

#[async_trait]
pub trait LeadNotifier: Send + Sync {
    async fn notify_new_lead(&self, lead: &Lead) -> Result<(), EmailError>;
}

/// Stand-in used when no mail transport is configured.
pub struct LogOnlyNotifier;

#[async_trait]
impl LeadNotifier for LogOnlyNotifier {
    async fn notify_new_lead(&self, lead: &Lead) -> Result<(), EmailError> {
        info!(lead_id = %lead.id, email = %lead.email, "Mail disabled, skipping lead notification");
        Ok(())
    }
}

pub fn subject_line(brand_name: &str, lead: &Lead) -> String {
    format!("[{brand_name}] New Lead: {} - {}", lead.name, lead.main_goal)
}

/// Plain-text body of the staff notification.
pub fn render_lead_summary(brand_name: &str, app_url: &str, lead: &Lead) -> String {
    let trial = if lead.booked_trial() {
        format!(
            "Trial session booked: {} at {}",
            lead.trial_date.as_deref().unwrap_or_default(),
            lead.trial_time.as_deref().unwrap_or_default()
        )
    } else {
        "Did not book a trial session".to_string()
    };

    format!(
        "{brand_name}: new lead captured\n\n\
         Name:          {}\n\
         Email:         {}\n\
         Phone:         {}\n\
         Fitness level: {}\n\
         Main goal:     {}\n\
         Timeline:      {}\n\
         Budget:        {}\n\n\
         {trial}\n\n\
         Captured {}\n\
         All leads: {}/admin\n",
        lead.name,
        lead.email,
        lead.phone,
        lead.fitness_level,
        lead.main_goal,
        lead.timeline,
        lead.budget,
        lead.created_at.format("%Y-%m-%d %H:%M UTC"),
        app_url.trim_end_matches('/'),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLead;

    fn lead(wants_trial: &str, slot: Option<(&str, &str)>) -> Lead {
        Lead::new(NewLead {
            name: "Jane".into(),
            email: "jane@x.com".into(),
            phone: "5551234567".into(),
            fitness_level: "beginner".into(),
            main_goal: "lose 20 lbs".into(),
            timeline: "this_week".into(),
            budget: "$100-200".into(),
            wants_trial: wants_trial.into(),
            trial_date: slot.map(|s| s.0.to_string()),
            trial_time: slot.map(|s| s.1.to_string()),
        })
    }

    #[test]
    fn summary_mentions_booked_slot() {
        let body = render_lead_summary(
            "Gym",
            "http://localhost:8080/",
            &lead("yes", Some(("Monday", "9:00 AM"))),
        );
        assert!(body.contains("Trial session booked: Monday at 9:00 AM"));
        assert!(body.contains("http://localhost:8080/admin"));
    }

    #[test]
    fn summary_without_slot_says_not_booked() {
        let body = render_lead_summary("Gym", "http://x", &lead("yes", None));
        assert!(body.contains("Did not book a trial session"));
        assert!(body.contains("Budget:        $100-200"));
    }

    #[test]
    fn subject_names_lead_and_goal() {
        assert_eq!(subject_line("Gym", &lead("no", None)), "[Gym] New Lead: Jane - lose 20 lbs");
    }

    #[tokio::test]
    async fn log_only_notifier_succeeds() {
        assert!(LogOnlyNotifier.notify_new_lead(&lead("no", None)).await.is_ok());
    }
}
