//! Conversational lead agent
//!
//! Features:
//! - Conversation session state machine (welcome, turns, message ceiling, latches)
//! - Additive 0-10 lead scoring
//! - Rental listing matching against the catalog
//! - Outbound call hand-off and explicit lead-form submission

pub mod lead_scoring;
pub mod listing_matcher;
pub mod session;

pub use lead_scoring::{score, score_with_band, MAX_SCORE};
pub use listing_matcher::{budget_ceiling, match_listings};
pub use session::{
    CallOutcome, Collaborators, ConversationSession, SessionFlags, SessionSnapshot, SessionState,
    TurnOutcome,
};

use roy_config::{AgentConfig, VocabularyConfig};
use roy_text_processing::{ExtractionOptions, LeadExtractor};
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// Malformed input, e.g. an empty message
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Explicit submit with missing data
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Session already open")]
    AlreadyOpen,

    #[error("Session is not active ({0})")]
    NotActive(SessionState),

    #[error("Message limit of {max} reached")]
    LimitReached { max: usize },

    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Collaborator failure surfaced to the caller
    #[error(transparent)]
    Core(#[from] roy_core::Error),
}

impl From<roy_text_processing::TextProcessingError> for AgentError {
    fn from(err: roy_text_processing::TextProcessingError) -> Self {
        AgentError::Initialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// Build the lead extractor described by the agent config
pub fn build_extractor(
    config: &AgentConfig,
    vocabulary: &VocabularyConfig,
) -> Result<LeadExtractor> {
    let options = ExtractionOptions {
        scope: config.extraction,
        include_assistant: config.extract_from_assistant,
    };
    Ok(LeadExtractor::new(vocabulary, options)?)
}
