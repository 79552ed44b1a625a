//! Brand copy and option tables for the qualification flow.
//!
//! Everything here is plain data. A [`BrandConfig`] is built once at startup
//! and shared by `Arc`, so several brands can run side by side.

use serde::{Deserialize, Serialize};

/// Ordered `key -> display text` table for a fixed-choice step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionTable {
    entries: Vec<(String, String)>,
}

impl OptionTable {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Display text for `key`, or the key itself when the table has no entry.
    // TODO: product review whether unknown keys should be rejected instead of echoed.
    pub fn display<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bot prompts, per-choice reactions and button labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationCopy {
    pub greeting: String,
    pub fitness_level_prompt: String,
    pub goal_prompt: String,
    pub timeline_prompt: String,
    pub budget_prompt: String,
    pub contact_prompt: String,
    pub trial_prompt: String,
    pub trial_slot_prompt: String,
    pub confirmation_message: String,

    pub fitness_level_responses: OptionTable,
    pub timeline_responses: OptionTable,

    pub greeting_options: OptionTable,
    pub fitness_level_options: OptionTable,
    pub timeline_options: OptionTable,
    pub budget_options: OptionTable,

    pub trial_accept_reply: String,
    pub trial_decline_reply: String,
    /// `{date}` and `{time}` are substituted.
    pub trial_booked_reply: String,

    pub generic_error: String,
    pub save_failed: String,
}

impl ConversationCopy {
    pub fn trial_booked_reply(&self, date: &str, time: &str) -> String {
        self.trial_booked_reply.replace("{date}", date).replace("{time}", time)
    }
}

impl Default for ConversationCopy {
    fn default() -> Self {
        Self {
            greeting: "Hey! Looking to get in shape and build real strength? You're in the right \
                       place. I'll help you find a plan that fits your life.\n\nWhat brings you \
                       here today?"
                .into(),
            fitness_level_prompt: "Great choice! Our program is designed to meet you where you \
                                   are.\n\nWhat's your current fitness level?"
                .into(),
            goal_prompt: "What's your main goal? (Be specific - e.g., 'lose 20lbs', 'build \
                          muscle', 'improve endurance')"
                .into(),
            timeline_prompt: "Love it! That's a clear target. Sustainable results come from \
                              consistent habits.\n\nWhen are you looking to start?"
                .into(),
            budget_prompt: "What's your budget range for membership?".into(),
            contact_prompt: "Got it! Let me get your contact info so we can send you the details \
                             and pricing options."
                .into(),
            trial_prompt: "Awesome! One last thing - want to schedule a FREE trial session? It's \
                           the best way to experience what we're all about. No pressure, just \
                           pure value."
                .into(),
            trial_slot_prompt: "Heck yeah! Pick a day and time that works for you:".into(),
            confirmation_message: "You're all set! We'll send you the details and follow up \
                                   within 24 hours. Get ready to start your fitness journey!"
                .into(),

            fitness_level_responses: OptionTable::new([
                (
                    "beginner",
                    "No worries! Everyone starts somewhere. Beginners often see the fastest \
                     results when they stay consistent.",
                ),
                (
                    "some_experience",
                    "Welcome back! Muscle memory is real - you'll be surprised how quickly \
                     things click again.",
                ),
                (
                    "advanced",
                    "Solid! Ready to take it to the next level. Let's dial in your training for \
                     maximum results.",
                ),
            ]),
            timeline_responses: OptionTable::new([
                (
                    "this_week",
                    "That's the spirit! Your future self is already thanking you for showing up.",
                ),
                ("within_month", "Perfect timing! Let's get you set up for success."),
                (
                    "just_exploring",
                    "Smart move! Knowledge first, then action. Let's see what works for your \
                     situation.",
                ),
            ]),

            greeting_options: OptionTable::new([
                ("weight_loss", "Sustainable fat loss"),
                ("build_muscle", "Build muscle and strength"),
                ("general_fitness", "General fitness and health"),
                ("personal_training", "Personal training"),
                ("browsing", "Just browsing"),
            ]),
            fitness_level_options: OptionTable::new([
                ("beginner", "Beginner - just getting started"),
                ("some_experience", "Some experience - getting back into it"),
                ("advanced", "Advanced - looking to optimize"),
            ]),
            timeline_options: OptionTable::new([
                ("this_week", "This week - ready to go!"),
                ("within_month", "Within the next month"),
                ("just_exploring", "Just exploring my options"),
            ]),
            budget_options: OptionTable::new([
                ("$50-100", "$50-100/month"),
                ("$100-200", "$100-200/month"),
                ("$200+", "$200+/month"),
                ("not_sure", "Not sure yet"),
            ]),

            trial_accept_reply: "Yes, let's book a trial session!".into(),
            trial_decline_reply: "No thanks, just send me the info".into(),
            trial_booked_reply: "Booked for {date} at {time}".into(),

            generic_error: "Oops! Let's try that again. No worries - everyone has hiccups \
                            sometimes."
                .into(),
            save_failed: "Failed to save your information. Please try again.".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub enable_email_notifications: bool,
    pub enable_analytics: bool,
    pub enable_trial_booking: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_email_notifications: true,
            enable_analytics: true,
            enable_trial_booking: true,
        }
    }
}

/// Everything a brand can customize about the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    pub copy: ConversationCopy,
    pub features: FeatureFlags,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: "Gym Lead Bot".into(),
            copy: ConversationCopy::default(),
            features: FeatureFlags::default(),
        }
    }
}
