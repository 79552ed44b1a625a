//! Funnel accounting over the four analytics event kinds.

use serde::{Deserialize, Serialize};

use crate::models::EventType;

/// Raw event totals by kind. Kinds with no events count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub widget_opens: u64,
    pub conversation_starts: u64,
    pub conversation_completes: u64,
    pub trials_booked: u64,
}

impl EventCounts {
    pub fn add(&mut self, event_type: EventType, count: u64) {
        let slot = match event_type {
            EventType::WidgetOpen => &mut self.widget_opens,
            EventType::ConversationStart => &mut self.conversation_starts,
            EventType::ConversationComplete => &mut self.conversation_completes,
            EventType::TrialBooked => &mut self.trials_booked,
        };
        *slot += count;
    }
}

impl FromIterator<EventType> for EventCounts {
    fn from_iter<I: IntoIterator<Item = EventType>>(iter: I) -> Self {
        let mut counts = EventCounts::default();
        for event_type in iter {
            counts.add(event_type, 1);
        }
        counts
    }
}

/// Dashboard numbers, derived from live counts on every query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub total_widget_opens: u64,
    pub total_conversation_starts: u64,
    pub total_conversation_completes: u64,
    pub total_trials_booked: u64,
    /// Completions per widget open, as a percentage.
    pub conversion_rate: f64,
    /// Bookings per completion, as a percentage.
    pub booking_rate: f64,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl From<EventCounts> for AnalyticsStats {
    fn from(counts: EventCounts) -> Self {
        Self {
            total_widget_opens: counts.widget_opens,
            total_conversation_starts: counts.conversation_starts,
            total_conversation_completes: counts.conversation_completes,
            total_trials_booked: counts.trials_booked,
            conversion_rate: percent(counts.conversation_completes, counts.widget_opens),
            booking_rate: percent(counts.trials_booked, counts.conversation_completes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: String,
    pub value: u64,
    pub percentage: u32,
}

impl AnalyticsStats {
    /// Funnel bars for the dashboard. Each stage is measured against widget
    /// opens, not against the stage before it.
    pub fn funnel(&self) -> Vec<FunnelStage> {
        let opens = self.total_widget_opens;
        let stage = |name: &str, value: u64, pct: f64| FunnelStage {
            stage: name.to_string(),
            value,
            percentage: pct.round() as u32,
        };
        vec![
            stage("Opens", opens, 100.0),
            stage(
                "Started",
                self.total_conversation_starts,
                percent(self.total_conversation_starts, opens),
            ),
            stage("Completed", self.total_conversation_completes, self.conversion_rate),
            stage("Booked", self.total_trials_booked, percent(self.total_trials_booked, opens)),
        ]
    }
}
