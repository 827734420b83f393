//! Curator types for message curation
//!
//! Defines the input message model, curated output, communication gaps,
//! and curator-specific errors.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single message in a conversation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message
    pub id: Uuid,
    /// Display name of the sender
    pub sender: String,
    /// Text content
    pub content: String,
    /// When the message was sent
    pub timestamp: DateTime<Utc>,
    /// Zero-based position in the original chronological order
    pub sequence: usize,
}

impl Message {
    /// Create a new message with a fresh identifier
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        sequence: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            content: content.into(),
            timestamp,
            sequence,
        }
    }
}

/// A message chosen for the curated output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedMessage {
    pub id: Uuid,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sequence: usize,
    /// Label of the time window the message was drawn from
    pub window_label: String,
    /// Explanatory ranking score. Roughly 0.0-1.0 but may exceed 1.0.
    pub representativeness_score: f32,
}

impl CuratedMessage {
    /// Build a curated message from its source message
    pub fn from_message(message: &Message, window_label: &str, score: f32) -> Self {
        Self {
            id: message.id,
            sender: message.sender.clone(),
            content: message.content.clone(),
            timestamp: message.timestamp,
            sequence: message.sequence,
            window_label: window_label.to_string(),
            representativeness_score: score,
        }
    }
}

/// A silence between two points of message activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationGap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_secs: i64,
}

impl CommunicationGap {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_secs: (end - start).num_seconds(),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_secs)
    }

    /// Whole days of silence
    pub fn days(&self) -> i64 {
        self.duration().num_days()
    }
}

/// Per-call curation options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurationOptions {
    /// Maximum number of curated messages
    pub target_count: usize,
}

impl Default for CurationOptions {
    fn default() -> Self {
        Self { target_count: 200 }
    }
}

impl CurationOptions {
    pub fn with_target(target_count: usize) -> Self {
        Self { target_count }
    }
}

/// Counters describing how a curation run went
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationStats {
    /// Number of input messages
    pub input_count: usize,
    /// True when the input fit the target and was returned verbatim
    pub passed_through: bool,
    /// Window length chosen for the input span (0 when passed through)
    pub window_days: i64,
    /// Number of windows produced by segmentation
    pub window_count: usize,
    /// Windows holding at least one message
    pub non_empty_windows: usize,
    /// Windows that had to be clustered and downsampled
    pub clustered_windows: usize,
    /// Candidates skipped as near-duplicates of earlier selections
    pub duplicates_skipped: usize,
}

/// Result of a curation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurationResult {
    /// Curated messages, ascending by timestamp
    pub messages: Vec<CuratedMessage>,
    /// Detected communication gaps, ascending by start
    pub gaps: Vec<CommunicationGap>,
    pub stats: CurationStats,
}

impl CurationResult {
    /// Result for an empty input
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Curator-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CurationError {
    #[error("Curation cancelled")]
    Cancelled,
    #[error("Embedding failed: {0}")]
    Embedding(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Clustering failed: {0}")]
    Clustering(String),
}

/// Result type alias for curator operations
pub type Result<T> = std::result::Result<T, CurationError>;
