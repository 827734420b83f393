//! Curator module for representative message selection
//!
//! The curator splits a timeline into time windows, gives each window a share
//! of the output budget, clusters over-budget windows by embedding and keeps
//! one deduplicated representative per cluster.

pub mod budget;
pub mod engine;
pub mod gaps;
pub mod kmeans;
pub mod select;
pub mod types;
pub mod window;

pub use engine::{EmbeddingSource, MessageCurator};
pub use gaps::{detect_gaps, detect_gaps_from_windows};
pub use types::{
    CommunicationGap, CuratedMessage, CurationError, CurationOptions, CurationResult,
    CurationStats, Message,
};
pub use window::{TimeWindow, segment_into_windows};
