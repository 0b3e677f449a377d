//! Error types for the agenda ecosystem.

use thiserror::Error;

/// Errors that can occur in agenda operations.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Could not present conflict: {0}")]
    Presentation(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AgendaError {
    fn from(err: serde_json::Error) -> Self {
        AgendaError::Serialization(err.to_string())
    }
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
