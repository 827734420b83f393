//! Chronicle - representative curation of long message timelines
//!
//! This crate reduces a chronologically ordered list of messages to a small
//! subset that keeps temporal coverage and conversational balance, and
//! reports the silences ("communication gaps") found along the way.

pub mod config;
pub mod curator;
pub mod embedding;
pub mod error;
pub mod testing;

pub use curator::{
    CommunicationGap, CuratedMessage, CurationError, CurationOptions, CurationResult,
    CurationStats, EmbeddingSource, Message, MessageCurator,
};
pub use embedding::EmbeddingProvider;
pub use error::ChronicleError;
