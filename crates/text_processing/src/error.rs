//! Error types for text processing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextProcessingError {
    /// A vocabulary-derived pattern failed to compile
    #[error("Invalid extraction pattern: {0}")]
    Pattern(String),

    #[error("Invalid vocabulary: {0}")]
    Vocabulary(String),
}

impl From<regex::Error> for TextProcessingError {
    fn from(err: regex::Error) -> Self {
        TextProcessingError::Pattern(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;
