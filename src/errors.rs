use thiserror::Error;
use validator::ValidationErrors;

use crate::flow::FlowError;

/// Top-level application error.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Record not found: {entity_type} with id '{id}'")]
    RecordNotFound { entity_type: String, id: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid event type '{event_type}'")]
    InvalidEventType { event_type: String },

    // ── Conversation errors ──────────────────────────────────────────────────
    #[error("Session '{id}' not found")]
    SessionNotFound { id: String },

    #[error("Conversation flow error: {0}")]
    Flow(#[from] FlowError),

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::SessionNotFound { .. } | AppError::RecordNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::InvalidEventType { .. }
                | AppError::Flow(FlowError::EmptyInput { .. })
        )
    }

    /// A transition the fixed conversation tree does not define.
    pub fn is_unreachable_transition(&self) -> bool {
        matches!(self, AppError::Flow(e) if !matches!(e, FlowError::EmptyInput { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::ConversationStep;

    #[test]
    fn classifies_flow_errors() {
        let empty = AppError::from(FlowError::EmptyInput { step: ConversationStep::MainGoal });
        assert!(empty.is_validation());
        assert!(!empty.is_unreachable_transition());

        let terminal = AppError::from(FlowError::Terminal);
        assert!(terminal.is_unreachable_transition());
        assert!(!terminal.is_validation());
    }

    #[test]
    fn not_found_covers_sessions_and_records() {
        assert!(AppError::SessionNotFound { id: "s".into() }.is_not_found());
        assert!(AppError::RecordNotFound { entity_type: "Lead".into(), id: "x".into() }
            .is_not_found());
        assert!(!AppError::Unexpected("boom".into()).is_not_found());
    }
}
