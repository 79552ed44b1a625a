//! The scripted qualification conversation.
//!
//! [`Flow::advance`] is the pure transition function over the fixed tree.
//! [`Conversation`] is one session: it owns the step, the lead draft and the
//! transcript, and reports which funnel events and which lead submission a
//! transition calls for. Running those side effects is the host's job.

pub mod copy;
pub mod draft;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub use copy::{BrandConfig, ConversationCopy, FeatureFlags, OptionTable};
pub use draft::LeadDraft;

use crate::models::{ChatMessage, ChatRole, EventType, NewLead};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    Greeting,
    FitnessLevel,
    MainGoal,
    Timeline,
    Budget,
    ContactInfo,
    TrialBooking,
    Confirmation,
}

impl ConversationStep {
    pub const ALL: [ConversationStep; 8] = [
        ConversationStep::Greeting,
        ConversationStep::FitnessLevel,
        ConversationStep::MainGoal,
        ConversationStep::Timeline,
        ConversationStep::Budget,
        ConversationStep::ContactInfo,
        ConversationStep::TrialBooking,
        ConversationStep::Confirmation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStep::Greeting => "greeting",
            ConversationStep::FitnessLevel => "fitness_level",
            ConversationStep::MainGoal => "main_goal",
            ConversationStep::Timeline => "timeline",
            ConversationStep::Budget => "budget",
            ConversationStep::ContactInfo => "contact_info",
            ConversationStep::TrialBooking => "trial_booking",
            ConversationStep::Confirmation => "confirmation",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationStep::Confirmation)
    }

    /// Position on the five-stage progress bar (Intro, Goals, Details,
    /// Booking, Done).
    pub fn progress_index(&self) -> usize {
        match self {
            ConversationStep::Greeting => 0,
            ConversationStep::FitnessLevel
            | ConversationStep::MainGoal
            | ConversationStep::Timeline
            | ConversationStep::Budget => 1,
            ConversationStep::ContactInfo => 2,
            ConversationStep::TrialBooking => 3,
            ConversationStep::Confirmation => 4,
        }
    }
}

impl std::fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ContactDetails {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 10, message = "Please enter a valid phone number"))]
    pub phone: String,
}

/// One answer from the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum UserInput {
    /// A button key on a fixed-choice step.
    Choice { key: String },
    /// Free text (the main goal).
    Text { text: String },
    Contact(ContactDetails),
    TrialChoice { wants_trial: bool },
    /// Slot picked from the booking calendar.
    TrialSlot { date: String, time: String },
}

impl UserInput {
    pub fn kind(&self) -> &'static str {
        match self {
            UserInput::Choice { .. } => "choice",
            UserInput::Text { .. } => "text",
            UserInput::Contact(_) => "contact",
            UserInput::TrialChoice { .. } => "trial_choice",
            UserInput::TrialSlot { .. } => "trial_slot",
        }
    }
}

/// Inputs outside the fixed tree. These are contract violations by the
/// caller, never something to paper over with a default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("conversation is already at confirmation")]
    Terminal,

    #[error("step '{step}' does not accept {input} input")]
    UnexpectedInput { step: ConversationStep, input: &'static str },

    #[error("step '{step}' requires a non-empty answer")]
    EmptyInput { step: ConversationStep },
}

/// Result of one transition: where the flow goes, what the visitor is shown
/// as having said, the bot's reply, and the lead fields captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ConversationStep,
    pub user_message: String,
    pub bot_message: Option<String>,
    pub patch: LeadDraft,
}

/// The transition function over the fixed tree, bound to one brand.
#[derive(Debug, Clone)]
pub struct Flow {
    brand: Arc<BrandConfig>,
}

impl Flow {
    pub fn new(brand: Arc<BrandConfig>) -> Self {
        Self { brand }
    }

    pub fn brand(&self) -> &BrandConfig {
        &self.brand
    }

    /// Computes the transition out of `step` for `input`.
    ///
    /// `draft` is consulted only on `trial_booking`, where a "yes" answer
    /// keeps the flow on that step until a slot arrives.
    pub fn advance(
        &self,
        step: ConversationStep,
        draft: &LeadDraft,
        input: &UserInput,
    ) -> Result<Transition, FlowError> {
        let copy = &self.brand.copy;
        let unexpected = || FlowError::UnexpectedInput { step, input: input.kind() };

        match (step, input) {
            (
                ConversationStep::Greeting
                | ConversationStep::FitnessLevel
                | ConversationStep::Timeline
                | ConversationStep::Budget,
                UserInput::Choice { key },
            ) if key.trim().is_empty() => Err(FlowError::EmptyInput { step }),

            (ConversationStep::Greeting, UserInput::Choice { key }) => Ok(Transition {
                next: ConversationStep::FitnessLevel,
                user_message: copy.greeting_options.display(key).to_string(),
                bot_message: Some(copy.fitness_level_prompt.clone()),
                patch: LeadDraft::default(),
            }),

            (ConversationStep::FitnessLevel, UserInput::Choice { key }) => Ok(Transition {
                next: ConversationStep::MainGoal,
                user_message: copy.fitness_level_options.display(key).to_string(),
                bot_message: Some(with_reaction(
                    copy.fitness_level_responses.get(key),
                    &copy.goal_prompt,
                )),
                patch: LeadDraft { fitness_level: Some(key.clone()), ..Default::default() },
            }),

            (ConversationStep::MainGoal, UserInput::Text { text }) => {
                let goal = text.trim();
                if goal.is_empty() {
                    return Err(FlowError::EmptyInput { step });
                }
                Ok(Transition {
                    next: ConversationStep::Timeline,
                    user_message: goal.to_string(),
                    bot_message: Some(copy.timeline_prompt.clone()),
                    patch: LeadDraft { main_goal: Some(goal.to_string()), ..Default::default() },
                })
            }

            (ConversationStep::Timeline, UserInput::Choice { key }) => Ok(Transition {
                next: ConversationStep::Budget,
                user_message: copy.timeline_options.display(key).to_string(),
                bot_message: Some(with_reaction(
                    copy.timeline_responses.get(key),
                    &copy.budget_prompt,
                )),
                patch: LeadDraft { timeline: Some(key.clone()), ..Default::default() },
            }),

            (ConversationStep::Budget, UserInput::Choice { key }) => Ok(Transition {
                next: ConversationStep::ContactInfo,
                user_message: copy.budget_options.display(key).to_string(),
                bot_message: Some(copy.contact_prompt.clone()),
                patch: LeadDraft { budget: Some(key.clone()), ..Default::default() },
            }),

            (ConversationStep::ContactInfo, UserInput::Contact(contact)) => {
                let mut patch = LeadDraft {
                    name: Some(contact.name.clone()),
                    email: Some(contact.email.clone()),
                    phone: Some(contact.phone.clone()),
                    ..Default::default()
                };
                let user_message = format!("{}\n{}\n{}", contact.name, contact.email, contact.phone);
                if self.brand.features.enable_trial_booking {
                    Ok(Transition {
                        next: ConversationStep::TrialBooking,
                        user_message,
                        bot_message: Some(copy.trial_prompt.clone()),
                        patch,
                    })
                } else {
                    patch.wants_trial = Some("no".into());
                    Ok(Transition {
                        next: ConversationStep::Confirmation,
                        user_message,
                        bot_message: Some(copy.confirmation_message.clone()),
                        patch,
                    })
                }
            }

            (ConversationStep::TrialBooking, UserInput::TrialChoice { wants_trial })
                if draft.wants_trial.is_none() =>
            {
                if *wants_trial {
                    Ok(Transition {
                        next: ConversationStep::TrialBooking,
                        user_message: copy.trial_accept_reply.clone(),
                        bot_message: Some(copy.trial_slot_prompt.clone()),
                        patch: LeadDraft { wants_trial: Some("yes".into()), ..Default::default() },
                    })
                } else {
                    Ok(Transition {
                        next: ConversationStep::Confirmation,
                        user_message: copy.trial_decline_reply.clone(),
                        bot_message: Some(copy.confirmation_message.clone()),
                        patch: LeadDraft { wants_trial: Some("no".into()), ..Default::default() },
                    })
                }
            }

            (ConversationStep::TrialBooking, UserInput::TrialSlot { date, time })
                if draft.wants_trial.as_deref() == Some("yes") =>
            {
                if date.trim().is_empty() || time.trim().is_empty() {
                    return Err(FlowError::EmptyInput { step });
                }
                Ok(Transition {
                    next: ConversationStep::Confirmation,
                    user_message: copy.trial_booked_reply(date, time),
                    bot_message: Some(copy.confirmation_message.clone()),
                    patch: LeadDraft {
                        trial_date: Some(date.clone()),
                        trial_time: Some(time.clone()),
                        ..Default::default()
                    },
                })
            }

            (ConversationStep::Confirmation, _) => Err(FlowError::Terminal),

            _ => Err(unexpected()),
        }
    }
}

fn with_reaction(reaction: Option<&str>, prompt: &str) -> String {
    match reaction {
        Some(reaction) => format!("{reaction}\n\n{prompt}"),
        None => prompt.to_string(),
    }
}

/// What a transition asks the host to do.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: ConversationStep,
    /// Funnel events to emit, fire-and-forget.
    pub events: Vec<EventType>,
    /// Lead to persist before showing confirmation, if one is due.
    pub submission: Option<NewLead>,
}

/// Input the widget should collect next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpectedInput {
    Choice { options: Vec<ChoiceOption> },
    Text,
    Contact,
    TrialChoice,
    TrialSlot,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub key: String,
    pub label: String,
}

fn choices(table: &OptionTable) -> ExpectedInput {
    ExpectedInput::Choice {
        options: table
            .keys()
            .map(|key| ChoiceOption { key: key.to_string(), label: table.display(key).to_string() })
            .collect(),
    }
}

/// One visitor's run through the flow.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    flow: Flow,
    step: ConversationStep,
    draft: LeadDraft,
    messages: Vec<ChatMessage>,
    visited: Vec<ConversationStep>,
    started: bool,
    lead_saved: bool,
}

impl Conversation {
    /// Starts at `greeting` with the opening bot message already in the
    /// transcript.
    pub fn new(id: impl Into<String>, flow: Flow) -> Self {
        let greeting = flow.brand().copy.greeting.clone();
        let mut conversation = Self {
            id: id.into(),
            flow,
            step: ConversationStep::Greeting,
            draft: LeadDraft::default(),
            messages: Vec::new(),
            visited: vec![ConversationStep::Greeting],
            started: false,
            lead_saved: false,
        };
        conversation.push_message(ChatRole::Bot, greeting);
        conversation
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn step(&self) -> ConversationStep {
        self.step
    }

    pub fn draft(&self) -> &LeadDraft {
        &self.draft
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Steps entered so far, in order, without repeats.
    pub fn visited(&self) -> &[ConversationStep] {
        &self.visited
    }

    pub fn lead_saved(&self) -> bool {
        self.lead_saved
    }

    /// Applies one visitor answer. The transcript and draft are only touched
    /// when the transition is defined.
    pub fn advance(&mut self, input: UserInput) -> Result<StepOutcome, FlowError> {
        let transition = self.flow.advance(self.step, &self.draft, &input)?;

        self.push_message(ChatRole::User, transition.user_message);
        if let Some(bot) = transition.bot_message {
            self.push_message(ChatRole::Bot, bot);
        }
        self.draft.merge(transition.patch);

        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            events.push(EventType::ConversationStart);
        }
        if transition.next != self.step {
            self.step = transition.next;
            self.visited.push(transition.next);
            if transition.next.is_terminal() {
                events.push(EventType::ConversationComplete);
            }
        }
        if matches!(input, UserInput::TrialSlot { .. }) {
            events.push(EventType::TrialBooked);
        }

        Ok(StepOutcome { step: self.step, events, submission: self.pending_submission() })
    }

    /// The lead still owed to the store: only at confirmation, only once the
    /// draft is complete, and never after a successful save.
    pub fn pending_submission(&self) -> Option<NewLead> {
        if !self.step.is_terminal() || self.lead_saved {
            return None;
        }
        self.draft.to_new_lead()
    }

    pub fn mark_lead_saved(&mut self) {
        self.lead_saved = true;
    }

    pub fn expected_input(&self) -> ExpectedInput {
        let copy = &self.flow.brand().copy;
        match self.step {
            ConversationStep::Greeting => choices(&copy.greeting_options),
            ConversationStep::FitnessLevel => choices(&copy.fitness_level_options),
            ConversationStep::MainGoal => ExpectedInput::Text,
            ConversationStep::Timeline => choices(&copy.timeline_options),
            ConversationStep::Budget => choices(&copy.budget_options),
            ConversationStep::ContactInfo => ExpectedInput::Contact,
            ConversationStep::TrialBooking if self.draft.wants_trial.is_some() => {
                ExpectedInput::TrialSlot
            }
            ConversationStep::TrialBooking => ExpectedInput::TrialChoice,
            ConversationStep::Confirmation => ExpectedInput::Done,
        }
    }

    fn push_message(&mut self, role: ChatRole, content: String) {
        let timestamp = self.next_timestamp();
        self.messages.push(ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            timestamp,
        });
    }

    // Wall-clock, nudged forward so transcript timestamps strictly increase.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.messages.last() {
            Some(last) if now <= last.timestamp => {
                last.timestamp + chrono::Duration::microseconds(1)
            }
            _ => now,
        }
    }
}
