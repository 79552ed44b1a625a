use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Storage;
use crate::analytics::EventCounts;
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, Lead, NewAnalyticsEvent, NewLead};

/// Process-local store for development and tests. Contents die with the
/// process.
#[derive(Default)]
pub struct MemoryStore {
    leads: RwLock<HashMap<String, Lead>>,
    events: RwLock<Vec<AnalyticsEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, AppError> {
        let lead = Lead::new(lead);
        self.leads.write().await.insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    async fn get_all_leads(&self) -> Result<Vec<Lead>, AppError> {
        let mut leads: Vec<Lead> = self.leads.read().await.values().cloned().collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn get_lead_by_id(&self, id: &str) -> Result<Option<Lead>, AppError> {
        Ok(self.leads.read().await.get(id).cloned())
    }

    async fn track_event(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AppError> {
        let event = AnalyticsEvent::new(event);
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn count_events(&self) -> Result<EventCounts, AppError> {
        Ok(self.events.read().await.iter().map(|e| e.event_type).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventType;

    fn lead(name: &str) -> NewLead {
        NewLead {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "5551234567".into(),
            fitness_level: "beginner".into(),
            main_goal: "get strong".into(),
            timeline: "within_month".into(),
            budget: "not_sure".into(),
            wants_trial: "no".into(),
            trial_date: None,
            trial_time: None,
        }
    }

    #[tokio::test]
    async fn create_then_fetch_by_id() {
        let store = MemoryStore::new();
        let created = store.create_lead(lead("Jane")).await.unwrap();
        let fetched = store.get_lead_by_id(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
        assert_eq!(store.get_lead_by_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn leads_listed_newest_first() {
        let store = MemoryStore::new();
        for name in ["Ann", "Bob", "Cat"] {
            store.create_lead(lead(name)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let names: Vec<_> =
            store.get_all_leads().await.unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Cat", "Bob", "Ann"]);
    }

    #[tokio::test]
    async fn stats_follow_tracked_events() {
        let store = MemoryStore::new();
        let empty = store.get_analytics_stats().await.unwrap();
        assert_eq!(empty.total_widget_opens, 0);
        assert_eq!(empty.conversion_rate, 0.0);

        for _ in 0..4 {
            store.track_event(NewAnalyticsEvent::new(EventType::WidgetOpen)).await.unwrap();
        }
        store
            .track_event(NewAnalyticsEvent::for_session(
                EventType::ConversationComplete,
                "s1",
                "confirmation",
            ))
            .await
            .unwrap();

        let stats = store.get_analytics_stats().await.unwrap();
        assert_eq!(stats.total_widget_opens, 4);
        assert_eq!(stats.total_conversation_completes, 1);
        assert_eq!(stats.conversion_rate, 25.0);
    }

    #[tokio::test]
    async fn tracked_event_gets_id_and_session() {
        let store = MemoryStore::new();
        let event = store
            .track_event(NewAnalyticsEvent::for_session(EventType::TrialBooked, "s9", "trial_booking"))
            .await
            .unwrap();
        assert!(!event.id.is_empty());
        assert_eq!(event.session_id.as_deref(), Some("s9"));
        assert_eq!(event.step_reached.as_deref(), Some("trial_booking"));
    }
}
