use serde::{Deserialize, Serialize};

use crate::models::NewLead;

/// Lead fields gathered so far in one conversation.
///
/// Also used as the patch a single transition produces: only the fields that
/// transition captured are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wants_trial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_time: Option<String>,
}

fn filled(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

impl LeadDraft {
    /// Applies the fields set in `patch`; fields it leaves unset are kept.
    pub fn merge(&mut self, patch: LeadDraft) {
        let LeadDraft {
            fitness_level,
            main_goal,
            timeline,
            budget,
            name,
            email,
            phone,
            wants_trial,
            trial_date,
            trial_time,
        } = patch;
        macro_rules! take {
            ($($field:ident),*) => {
                $( if $field.is_some() { self.$field = $field; } )*
            };
        }
        take!(
            fitness_level,
            main_goal,
            timeline,
            budget,
            name,
            email,
            phone,
            wants_trial,
            trial_date,
            trial_time
        );
    }

    /// True when every field a lead requires is present and non-empty.
    ///
    /// The trial date and time are never required, even when `wants_trial`
    /// is `"yes"`.
    pub fn is_complete(&self) -> bool {
        [
            &self.name,
            &self.email,
            &self.phone,
            &self.fitness_level,
            &self.main_goal,
            &self.timeline,
            &self.budget,
            &self.wants_trial,
        ]
        .into_iter()
        .all(filled)
    }

    /// Lead fields ready for submission, or `None` while incomplete.
    pub fn to_new_lead(&self) -> Option<NewLead> {
        if !self.is_complete() {
            return None;
        }
        Some(NewLead {
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
            fitness_level: self.fitness_level.clone().unwrap_or_default(),
            main_goal: self.main_goal.clone().unwrap_or_default(),
            timeline: self.timeline.clone().unwrap_or_default(),
            budget: self.budget.clone().unwrap_or_default(),
            wants_trial: self.wants_trial.clone().unwrap_or_default(),
            trial_date: self.trial_date.clone().filter(|v| !v.is_empty()),
            trial_time: self.trial_time.clone().filter(|v| !v.is_empty()),
        })
    }
}
