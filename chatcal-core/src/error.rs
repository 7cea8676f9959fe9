//! Error types for the chatcal ecosystem.

use thiserror::Error;

/// Errors that can occur in chatcal operations.
#[derive(Error, Debug)]
pub enum ChatCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar provider error: {0}")]
    Provider(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Classifier '{0}' not found in PATH")]
    ClassifierNotInstalled(String),

    #[error("Classifier timed out after {0}s")]
    ClassifierTimeout(u64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for chatcal operations.
pub type ChatCalResult<T> = Result<T, ChatCalError>;
