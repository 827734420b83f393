//! Error types for Chronicle

use thiserror::Error;

use crate::curator::CurationError;

/// Main error type for Chronicle operations
#[derive(Error, Debug)]
pub enum ChronicleError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding provider setup or inference errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Errors raised by a curation run
    #[error("Curation error: {0}")]
    Curation(#[from] CurationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl From<serde_json::Error> for ChronicleError {
    fn from(e: serde_json::Error) -> Self {
        ChronicleError::Serialization(e.to_string())
    }
}

/// Result type alias for Chronicle operations
pub type Result<T> = std::result::Result<T, ChronicleError>;
