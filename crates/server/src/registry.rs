//! Session registry
//!
//! Live chat sessions keyed by id. Each session sits behind its own async mutex so turns
//! in different sessions never contend.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use roy_agent::{Collaborators, ConversationSession};
use roy_config::AgentConfig;
use roy_text_processing::LeadExtractor;

pub type SessionHandle = Arc<Mutex<ConversationSession>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session in the `Idle` state and register it
    pub fn create(
        &self,
        config: AgentConfig,
        extractor: Arc<LeadExtractor>,
        collaborators: Collaborators,
    ) -> (String, SessionHandle) {
        let id = uuid::Uuid::new_v4().to_string();
        let session = ConversationSession::new(id.clone(), config, extractor, collaborators);
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id.clone(), handle.clone());
        (id, handle)
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle past their timeout. Sessions mid-turn are skipped.
    pub fn sweep_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, handle| match handle.try_lock() {
            Ok(session) if session.is_expired() => {
                tracing::info!(session_id = %id, "Session expired");
                false
            },
            _ => true,
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Run [`Self::sweep_expired`] every `interval` until the task is aborted
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = registry.sweep_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = registry.count(), "Swept idle sessions");
                }
            }
        })
    }
}
