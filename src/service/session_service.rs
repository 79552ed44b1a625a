use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use validator::Validate;

use crate::errors::AppError;
use crate::flow::{Conversation, ConversationStep, ExpectedInput, Flow, LeadDraft, UserInput};
use crate::models::{ChatMessage, NewAnalyticsEvent, NewLead};
use crate::service::analytics_service::AnalyticsService;
use crate::service::lead_service::LeadService;

/// Snapshot of a session returned to the widget after every call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub step: ConversationStep,
    pub progress: usize,
    pub messages: Vec<ChatMessage>,
    pub lead_data: LeadDraft,
    pub expected_input: ExpectedInput,
    pub lead_saved: bool,
    /// Set when the lead could not be stored; the widget offers a retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

impl SessionView {
    fn of(conversation: &Conversation, save_error: Option<String>) -> Self {
        Self {
            id: conversation.id().to_string(),
            step: conversation.step(),
            progress: conversation.step().progress_index(),
            messages: conversation.messages().to_vec(),
            lead_data: conversation.draft().clone(),
            expected_input: conversation.expected_input(),
            lead_saved: conversation.lead_saved(),
            save_error,
        }
    }
}

/// Default for how long an untouched session is kept.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct HostedSession {
    conversation: Conversation,
    touched: Instant,
}

impl HostedSession {
    fn touch(&mut self) -> &mut Conversation {
        self.touched = Instant::now();
        &mut self.conversation
    }
}

/// Hosts conversations on the server and runs their side effects.
///
/// Each session sits behind its own mutex, so one visitor's steps run
/// strictly in order while different visitors proceed independently.
/// Sessions nobody has touched for `idle_ttl` are dropped by
/// [`SessionService::evict_idle`].
#[derive(Clone)]
pub struct SessionService {
    flow: Flow,
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<HostedSession>>>>>,
    idle_ttl: Duration,
    leads: LeadService,
    analytics: AnalyticsService,
}

impl SessionService {
    pub fn new(flow: Flow, leads: LeadService, analytics: AnalyticsService) -> Self {
        Self {
            flow,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl: DEFAULT_IDLE_TTL,
            leads,
            analytics,
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub async fn start(&self) -> SessionView {
        let id = uuid::Uuid::new_v4().to_string();
        let conversation = Conversation::new(id.clone(), self.flow.clone());
        let view = SessionView::of(&conversation, None);
        let hosted = HostedSession { conversation, touched: Instant::now() };
        self.sessions.write().await.insert(id.clone(), Arc::new(Mutex::new(hosted)));
        info!(session_id = %id, "Conversation session started");
        view
    }

    pub async fn get(&self, id: &str) -> Result<SessionView, AppError> {
        let session = self.session(id).await?;
        let mut hosted = session.lock().await;
        Ok(SessionView::of(hosted.touch(), None))
    }

    /// Applies one visitor answer and runs what the transition calls for:
    /// funnel events go out detached, a due lead is persisted before the
    /// view is returned.
    pub async fn advance(&self, id: &str, input: UserInput) -> Result<SessionView, AppError> {
        if let UserInput::Contact(contact) = &input {
            contact.validate()?;
        }

        let session = self.session(id).await?;
        let mut hosted = session.lock().await;
        let conversation = hosted.touch();

        let step = conversation.step();
        let outcome = conversation.advance(input).map_err(|e| {
            error!(session_id = %id, step = %step, "Rejected transition: {e}");
            AppError::from(e)
        })?;

        for event_type in outcome.events {
            self.analytics.track_detached(NewAnalyticsEvent::for_session(
                event_type,
                id,
                outcome.step.as_str(),
            ));
        }

        let save_error = match outcome.submission {
            Some(lead) => self.submit(conversation, lead).await,
            None => None,
        };
        Ok(SessionView::of(conversation, save_error))
    }

    /// Re-attempts a lead save that failed at confirmation. A session whose
    /// lead is already stored is returned unchanged.
    pub async fn retry_submission(&self, id: &str) -> Result<SessionView, AppError> {
        let session = self.session(id).await?;
        let mut hosted = session.lock().await;
        let conversation = hosted.touch();
        let save_error = match conversation.pending_submission() {
            Some(lead) => self.submit(conversation, lead).await,
            None => None,
        };
        Ok(SessionView::of(conversation, save_error))
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for at least `idle_ttl` and returns how many
    /// went. A session locked by an in-flight request is never idle.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(hosted) => hosted.touched.elapsed() < self.idle_ttl,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle conversation sessions");
        }
        evicted
    }

    /// Runs [`evict_idle`](Self::evict_idle) every `period` until the
    /// returned task is aborted.
    pub fn spawn_eviction(&self, period: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.evict_idle().await;
            }
        })
    }

    async fn session(&self, id: &str) -> Result<Arc<Mutex<HostedSession>>, AppError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound { id: id.to_string() })
    }

    async fn submit(&self, conversation: &mut Conversation, lead: NewLead) -> Option<String> {
        match self.leads.create_lead(lead).await {
            Ok(saved) => {
                conversation.mark_lead_saved();
                info!(session_id = %conversation.id(), lead_id = %saved.id, "Session lead saved");
                None
            }
            Err(e) => {
                warn!(session_id = %conversation.id(), "Session lead not saved: {e}");
                Some(self.flow.brand().copy.save_failed.clone())
            }
        }
    }
}
