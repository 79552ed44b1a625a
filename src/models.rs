use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// ── Leads ────────────────────────────────────────────────────────────────────

/// A persisted, immutable lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub fitness_level: String,
    pub main_goal: String,
    pub timeline: String,
    pub budget: String,
    pub wants_trial: String,
    pub trial_date: Option<String>,
    pub trial_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(fields: NewLead) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            fitness_level: fields.fitness_level,
            main_goal: fields.main_goal,
            timeline: fields.timeline,
            budget: fields.budget,
            wants_trial: fields.wants_trial,
            trial_date: fields.trial_date,
            trial_time: fields.trial_time,
            created_at: Utc::now(),
        }
    }

    pub fn booked_trial(&self) -> bool {
        self.wants_trial == "yes" && self.trial_date.is_some() && self.trial_time.is_some()
    }
}

/// Lead fields as submitted, before an id and timestamp are assigned.
///
/// Every string field defaults to empty so a missing key is reported as a
/// field-level validation error rather than a body parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 10, message = "Please enter a valid phone number"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Fitness level is required"))]
    pub fitness_level: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Main goal is required"))]
    pub main_goal: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Timeline is required"))]
    pub timeline: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Budget is required"))]
    pub budget: String,
    #[serde(default)]
    #[validate(custom(function = "validate_wants_trial"))]
    pub wants_trial: String,
    #[serde(default)]
    pub trial_date: Option<String>,
    #[serde(default)]
    pub trial_time: Option<String>,
}

fn validate_wants_trial(value: &str) -> Result<(), ValidationError> {
    match value {
        "yes" | "no" => Ok(()),
        _ => {
            let mut err = ValidationError::new("wants_trial");
            err.message = Some("Must be \"yes\" or \"no\"".into());
            Err(err)
        }
    }
}

// ── Analytics events ─────────────────────────────────────────────────────────

/// The four funnel events the widget and the session host emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    WidgetOpen,
    ConversationStart,
    ConversationComplete,
    TrialBooked,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::WidgetOpen,
        EventType::ConversationStart,
        EventType::ConversationComplete,
        EventType::TrialBooked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::WidgetOpen => "widget_open",
            EventType::ConversationStart => "conversation_start",
            EventType::ConversationComplete => "conversation_complete",
            EventType::TrialBooked => "trial_booked",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventType {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown event type: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    pub event_type: EventType,
    pub session_id: Option<String>,
    pub step_reached: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(fields: NewAnalyticsEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: fields.event_type,
            session_id: fields.session_id,
            step_reached: fields.step_reached,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalyticsEvent {
    pub event_type: EventType,
    pub session_id: Option<String>,
    pub step_reached: Option<String>,
}

impl NewAnalyticsEvent {
    pub fn new(event_type: EventType) -> Self {
        Self { event_type, session_id: None, step_reached: None }
    }

    pub fn for_session(event_type: EventType, session_id: &str, step: &str) -> Self {
        Self {
            event_type,
            session_id: Some(session_id.to_string()),
            step_reached: Some(step.to_string()),
        }
    }
}

/// Body of `POST /api/analytics/track`. The event type stays a raw string
/// here so an unknown kind can be reported as a 400.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    #[serde(default)]
    pub event_type: String,
    pub session_id: Option<String>,
    pub step_reached: Option<String>,
}

impl TryFrom<TrackEventRequest> for NewAnalyticsEvent {
    type Error = String;
    fn try_from(req: TrackEventRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            event_type: EventType::try_from(req.event_type.as_str())?,
            session_id: req.session_id,
            step_reached: req.step_reached,
        })
    }
}

// ── Conversation transcript ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Bot,
    User,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::Bot => "bot",
            ChatRole::User => "user",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

// ── AI pass-through ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}
