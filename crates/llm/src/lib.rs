//! Reply generation for Roy
//!
//! Features:
//! - Claude Messages API backend
//! - Roy persona prompt with per-turn lead status
//! - Splitting long replies into chat-sized fragments
//! - Scripted generator for offline runs and tests

pub mod claude;
pub mod prompt;
pub mod scripted;
pub mod splitter;

pub use claude::{ClaudeConfig, ClaudeReplyGenerator, ClaudeStopReason};
pub use prompt::RoyPrompt;
pub use scripted::ScriptedReplyGenerator;
pub use splitter::split_reply;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for roy_core::Error {
    fn from(err: LlmError) -> Self {
        roy_core::Error::Reply(err.to_string())
    }
}
