//! Agent configuration
//!
//! Conversation limits, extraction scope and pacing for Roy's chat sessions. Defaults come
//! from [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants::{limits, messages};

/// Which part of the transcript recency-sensitive fields (rent/buy, urgency) are read from
///
/// Every other field is always extracted from the full transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExtractionScope {
    /// Scan every message
    #[default]
    FullTranscript,
    /// Scan only the last `messages` messages
    RecentWindow { messages: usize },
}

impl ExtractionScope {
    pub fn recent() -> Self {
        ExtractionScope::RecentWindow {
            messages: limits::RECENT_WINDOW,
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name used in prompts and transcripts
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// First message of every session
    #[serde(default = "default_welcome")]
    pub welcome_message: String,

    /// Hard ceiling on messages per session
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Message count at which the call prompt latches
    #[serde(default = "default_call_prompt_threshold")]
    pub call_prompt_threshold: usize,

    /// Message count required before the lead form can latch
    #[serde(default = "default_lead_form_min_messages")]
    pub lead_form_min_messages: usize,

    #[serde(default)]
    pub extraction: ExtractionScope,

    /// Also extract lead fields from Roy's own messages
    #[serde(default)]
    pub extract_from_assistant: bool,

    /// Listings offered to renters
    #[serde(default = "default_max_listing_results")]
    pub max_listing_results: usize,

    /// Emulate typing delays between reply fragments
    #[serde(default)]
    pub pacing_enabled: bool,

    /// Sessions idle for longer than this are discarded
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_agent_name() -> String {
    "Roy".to_string()
}
fn default_welcome() -> String {
    messages::WELCOME.to_string()
}
fn default_max_messages() -> usize {
    limits::MAX_MESSAGES
}
fn default_call_prompt_threshold() -> usize {
    limits::CALL_PROMPT_THRESHOLD
}
fn default_lead_form_min_messages() -> usize {
    limits::LEAD_FORM_MIN_MESSAGES
}
fn default_max_listing_results() -> usize {
    limits::MAX_LISTING_RESULTS
}
fn default_idle_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            welcome_message: default_welcome(),
            max_messages: default_max_messages(),
            call_prompt_threshold: default_call_prompt_threshold(),
            lead_form_min_messages: default_lead_form_min_messages(),
            extraction: ExtractionScope::default(),
            extract_from_assistant: false,
            max_listing_results: default_max_listing_results(),
            pacing_enabled: false,
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}
