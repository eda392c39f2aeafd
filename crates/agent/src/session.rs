//! Conversation Session
//!
//! One visitor's chat with Roy, as an owned aggregate. The session holds the transcript,
//! the lead record built from it, and the UI latches, and is the only writer of all three.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──open──▶ Active ──send at the message ceiling──▶ LimitReached
//! ```
//!
//! A turn (`send`) appends the visitor's message, asks the reply generator for Roy's reply,
//! re-extracts lead fields from the whole transcript and persists the merged record. Only a
//! failure to create the lead is surfaced; a failed reply becomes a fallback message and a
//! failed store update is logged.
//!
//! Operations take `&mut self`, so a session runs one turn at a time. Callers that share a
//! session hold it behind a mutex and treat a held lock as "busy".

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use roy_config::constants::{messages, pacing};
use roy_config::AgentConfig;
use roy_core::{
    CallTrigger, LeadField, LeadRecord, LeadStatus, LeadStore, LeadUpdate, Message,
    ReplyGenerator, Transcript,
};
use roy_text_processing::LeadExtractor;

use crate::lead_scoring;
use crate::{AgentError, Result};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, welcome not yet shown
    Idle,
    /// Accepting messages
    Active,
    /// Message ceiling hit; only a call request is still possible
    LimitReached,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Active => write!(f, "active"),
            SessionState::LimitReached => write!(f, "limit_reached"),
        }
    }
}

/// UI latches. Once set, never cleared for the life of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFlags {
    pub call_prompt_shown: bool,
    pub lead_form_shown: bool,
    pub completed: bool,
}

/// External collaborators a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub replies: Arc<dyn ReplyGenerator>,
    pub store: Arc<dyn LeadStore>,
    pub calls: Arc<dyn CallTrigger>,
}

/// Result of an accepted `send`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// Roy's messages appended this turn
    pub replies: Vec<Message>,
    /// The fallback text was used instead of generated replies
    pub reply_failed: bool,
    pub lead: LeadRecord,
    pub score: u8,
    pub flags: SessionFlags,
    pub message_count: usize,
    pub state: SessionState,
}

/// Result of a call request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    pub placed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Confirmation or apology appended to the transcript
    pub message: Message,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub state: SessionState,
    pub message_count: usize,
    pub max_messages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    pub lead: LeadRecord,
    pub score: u8,
    pub flags: SessionFlags,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

/// A single visitor's conversation with Roy
pub struct ConversationSession {
    id: String,
    config: AgentConfig,
    state: SessionState,
    transcript: Transcript,
    /// Chat messages counted toward the ceiling
    message_count: usize,
    lead: LeadRecord,
    /// Values the visitor entered in the lead form; later extraction never overrides them
    confirmed: LeadRecord,
    lead_id: Option<String>,
    score: u8,
    flags: SessionFlags,
    extractor: Arc<LeadExtractor>,
    collaborators: Collaborators,
    created_at: DateTime<Utc>,
    last_activity: Instant,
}

impl ConversationSession {
    pub fn new(
        id: impl Into<String>,
        config: AgentConfig,
        extractor: Arc<LeadExtractor>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            id: id.into(),
            config,
            state: SessionState::Idle,
            transcript: Transcript::new(),
            message_count: 0,
            lead: LeadRecord::new(),
            confirmed: LeadRecord::new(),
            lead_id: None,
            score: 0,
            flags: SessionFlags::default(),
            extractor,
            collaborators,
            created_at: Utc::now(),
            last_activity: Instant::now(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn lead(&self) -> &LeadRecord {
        &self.lead
    }

    pub fn lead_id(&self) -> Option<&str> {
        self.lead_id.as_deref()
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn flags(&self) -> SessionFlags {
        self.flags
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Time since the last open/send/call/form action
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.idle_for() >= Duration::from_secs(self.config.idle_timeout_secs)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            state: self.state,
            message_count: self.message_count,
            max_messages: self.config.max_messages,
            lead_id: self.lead_id.clone(),
            lead: self.lead.clone(),
            score: self.score,
            flags: self.flags,
            created_at: self.created_at,
            messages: self.transcript.messages().to_vec(),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Show the welcome message and start accepting messages
    pub fn open(&mut self) -> Result<Message> {
        if self.state != SessionState::Idle {
            return Err(AgentError::AlreadyOpen);
        }
        let welcome = Message::assistant(self.config.welcome_message.clone());
        self.transcript.push(welcome.clone());
        self.message_count = 1;
        self.state = SessionState::Active;
        self.last_activity = Instant::now();

        tracing::info!(session_id = %self.id, "Session opened");
        Ok(welcome)
    }

    /// Run one visitor turn
    pub async fn send(&mut self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::InvalidInput(
                "message text must not be empty".to_string(),
            ));
        }
        match self.state {
            SessionState::Active => {},
            SessionState::LimitReached => {
                return Err(AgentError::LimitReached {
                    max: self.config.max_messages,
                })
            },
            SessionState::Idle => return Err(AgentError::NotActive(self.state)),
        }

        // A turn needs room for the visitor's message and at least one reply
        if self.message_count + 2 > self.config.max_messages {
            self.flags.call_prompt_shown = true;
            self.flags.completed = true;
            self.state = SessionState::LimitReached;
            tracing::info!(
                session_id = %self.id,
                message_count = self.message_count,
                "Message limit reached"
            );
            return Err(AgentError::LimitReached {
                max: self.config.max_messages,
            });
        }

        self.last_activity = Instant::now();
        self.transcript.push(Message::user(text));
        self.message_count += 1;

        if self.lead_id.is_none() {
            if let Err(e) = self.create_lead().await {
                self.transcript.pop();
                self.message_count -= 1;
                tracing::error!(session_id = %self.id, error = %e, "Lead creation failed");
                return Err(e.into());
            }
        }

        let (replies, reply_failed) = self.generate_replies().await;

        let mut extracted = self.extractor.extract(&self.transcript);
        extracted.merge(&self.confirmed);
        if self.lead.merge(&extracted) {
            tracing::debug!(session_id = %self.id, "Lead record updated");
        }
        self.score = lead_scoring::score(&self.lead);
        self.persist(LeadUpdate::new()).await;
        self.evaluate_latches();

        Ok(TurnOutcome {
            replies,
            reply_failed,
            lead: self.lead.clone(),
            score: self.score,
            flags: self.flags,
            message_count: self.message_count,
            state: self.state,
        })
    }

    /// Place an outbound call to the visitor
    pub async fn request_call(&mut self, phone: &str) -> Result<CallOutcome> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(AgentError::Validation(
                "phone number is required".to_string(),
            ));
        }
        if self.state == SessionState::Idle {
            return Err(AgentError::NotActive(self.state));
        }
        self.last_activity = Instant::now();

        self.lead.merge(&LeadRecord::new().with_phone(phone));
        self.score = lead_scoring::score(&self.lead);
        self.ensure_lead().await;
        self.persist(
            LeadUpdate::new()
                .with_status(LeadStatus::Contacted)
                .with_call_made(true),
        )
        .await;

        let summary = self.transcript.call_summary();
        let (placed, call_id, text) =
            match self.collaborators.calls.initiate(phone, &summary).await {
                Ok(receipt) => {
                    tracing::info!(
                        session_id = %self.id,
                        call_id = %receipt.call_id,
                        provider = self.collaborators.calls.name(),
                        "Outbound call placed"
                    );
                    (
                        true,
                        Some(receipt.call_id),
                        messages::CALL_STARTED.replace("{phone}", phone),
                    )
                },
                Err(e) => {
                    tracing::warn!(session_id = %self.id, error = %e, "Outbound call failed");
                    (false, None, messages::CALL_FAILED.to_string())
                },
            };

        // Call notices are not chat messages and do not count toward the ceiling
        let message = Message::assistant(text);
        self.transcript.push(message.clone());
        self.flags.completed = true;

        Ok(CallOutcome {
            placed,
            call_id,
            message,
        })
    }

    /// Explicit lead-form submission
    ///
    /// All form-required fields must be present; otherwise nothing changes.
    pub async fn submit_lead_form(&mut self, form: &LeadRecord) -> Result<LeadRecord> {
        // Blank values count as missing
        let mut form_values = LeadRecord::new();
        form_values.merge(form);
        let missing = form_values.missing_form_fields();
        if !missing.is_empty() {
            return Err(AgentError::Validation(format!(
                "missing required fields: {}",
                missing
                    .iter()
                    .map(LeadField::key)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        if self.state == SessionState::Idle {
            return Err(AgentError::NotActive(self.state));
        }
        self.last_activity = Instant::now();

        self.lead.merge(&form_values);
        self.confirmed.merge(&form_values);
        self.score = lead_scoring::score(&self.lead);
        self.ensure_lead().await;
        self.persist(LeadUpdate::new()).await;

        tracing::info!(session_id = %self.id, score = self.score, "Lead form submitted");
        Ok(self.lead.clone())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn create_lead(&mut self) -> roy_core::Result<()> {
        let lead_id = self.collaborators.store.create(&self.lead).await?;
        tracing::info!(session_id = %self.id, lead_id = %lead_id, "Lead created");
        self.lead_id = Some(lead_id);
        Ok(())
    }

    /// Create the lead outside the first-message path; failures are logged only
    async fn ensure_lead(&mut self) {
        if self.lead_id.is_none() {
            if let Err(e) = self.create_lead().await {
                tracing::warn!(session_id = %self.id, error = %e, "Lead creation failed");
            }
        }
    }

    async fn generate_replies(&mut self) -> (Vec<Message>, bool) {
        let generator = self.collaborators.replies.clone();
        let result = generator
            .generate(&self.transcript, &self.lead, self.message_count)
            .await;

        let (fragments, failed) = match result {
            Ok(replies) => (replies.into_vec(), false),
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id,
                    generator = generator.name(),
                    error = %e,
                    "Reply generation failed, using fallback"
                );
                (vec![messages::REPLY_FALLBACK.to_string()], true)
            },
        };

        let room = self.config.max_messages.saturating_sub(self.message_count);
        let mut appended = Vec::with_capacity(fragments.len().min(room));
        for (i, fragment) in fragments.into_iter().take(room).enumerate() {
            if self.config.pacing_enabled {
                if i > 0 {
                    tokio::time::sleep(Duration::from_millis(pacing::BETWEEN_FRAGMENTS_MS)).await;
                }
                tokio::time::sleep(typing_delay(&fragment)).await;
            }
            let message = Message::assistant(fragment);
            self.transcript.push(message.clone());
            self.message_count += 1;
            appended.push(message);
        }
        (appended, failed)
    }

    /// Write the current record plus `update`'s bookkeeping; failures are logged only
    async fn persist(&self, update: LeadUpdate) {
        let Some(lead_id) = self.lead_id.as_deref() else {
            return;
        };
        let update = LeadUpdate {
            record: self.lead.clone(),
            score: Some(self.score),
            conversation_summary: Some(self.transcript.summary()),
            ..update
        };
        if let Err(e) = self.collaborators.store.update(lead_id, &update).await {
            tracing::warn!(
                session_id = %self.id,
                lead_id = %lead_id,
                store = self.collaborators.store.name(),
                error = %e,
                "Lead update failed"
            );
        }
    }

    fn evaluate_latches(&mut self) {
        if self.message_count >= self.config.call_prompt_threshold && !self.flags.call_prompt_shown
        {
            self.flags.call_prompt_shown = true;
            self.flags.completed = true;
            tracing::info!(session_id = %self.id, "Call prompt latched");
        }
        if !self.flags.lead_form_shown
            && self.message_count >= self.config.lead_form_min_messages
            && self.lead.missing_form_fields().is_empty()
        {
            self.flags.lead_form_shown = true;
            tracing::info!(session_id = %self.id, "Lead form latched");
        }
    }
}

/// Emulated typing time for a fragment
pub fn typing_delay(fragment: &str) -> Duration {
    let ms = (fragment.chars().count() as u64 * pacing::MS_PER_CHAR).min(pacing::MAX_TYPING_MS);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_delay_capped() {
        assert_eq!(typing_delay("hello"), Duration::from_millis(75));
        assert_eq!(typing_delay(&"x".repeat(1000)), Duration::from_millis(2000));
    }
}
