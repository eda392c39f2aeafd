//! Error types shared across crates
//!
//! Collaborator crates convert their own errors into [`Error`] at the trait seams so the
//! session state machine only ever sees one taxonomy.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required field was missing on an explicit submit
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Malformed input rejected at the boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Lead store unreachable or rejected the request
    #[error("Lead store error: {0}")]
    Store(String),

    /// Reply generator failed
    #[error("Reply generation failed: {0}")]
    Reply(String),

    /// Outbound call could not be placed
    #[error("Call trigger failed: {0}")]
    Call(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Transient collaborator failures are recovered locally by the session
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Reply(_) | Error::Call(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
