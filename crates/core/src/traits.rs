//! Collaborator traits
//!
//! The session state machine talks to the outside world only through these seams:
//! - `ReplyGenerator`: produces Roy's next reply fragments
//! - `LeadStore`: persists lead records keyed by lead id
//! - `CallTrigger`: places an outbound voice call
//!
//! Each has a network-backed implementation and an in-memory one for tests and offline runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::Transcript;
use crate::error::Result;
use crate::lead::{LeadFilter, LeadRecord, LeadUpdate, StoredLead};

// =============================================================================
// Reply generation
// =============================================================================

/// Non-empty ordered sequence of reply fragments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Replies(Vec<String>);

impl Replies {
    pub fn single(reply: impl Into<String>) -> Self {
        Self(vec![reply.into()])
    }

    /// Build from fragments, dropping blank ones. `None` if nothing is left.
    pub fn from_fragments<I, S>(fragments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments
            .into_iter()
            .map(Into::into)
            .filter(|f| !f.trim().is_empty())
            .collect();
        if fragments.is_empty() {
            None
        } else {
            Some(Self(fragments))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    // Never empty; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl IntoIterator for Replies {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Produces Roy's next reply given the conversation so far
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate one or more sequential reply fragments
    async fn generate(
        &self,
        transcript: &Transcript,
        known: &LeadRecord,
        message_count: usize,
    ) -> Result<Replies>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

// =============================================================================
// Lead storage
// =============================================================================

/// Persistent store of leads
///
/// Updates are last-write-wins; there is no versioning.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert a new lead with default bookkeeping, returning its id
    async fn create(&self, initial: &LeadRecord) -> Result<String>;

    async fn update(&self, lead_id: &str, update: &LeadUpdate) -> Result<()>;

    async fn delete(&self, lead_id: &str) -> Result<()>;

    async fn get(&self, lead_id: &str) -> Result<StoredLead>;

    /// Leads matching `filter`, newest first
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<StoredLead>>;

    /// Whether the backing store is reachable
    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

// =============================================================================
// Outbound calls
// =============================================================================

/// Receipt for a call that was successfully placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReceipt {
    pub call_id: String,
}

/// Places an outbound voice call to a lead
#[async_trait]
pub trait CallTrigger: Send + Sync {
    async fn initiate(&self, phone_number: &str, transcript_summary: &str)
        -> Result<CallReceipt>;

    fn name(&self) -> &str;
}
