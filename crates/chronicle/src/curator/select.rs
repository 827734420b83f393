//! Candidate scoring and greedy representative selection
//!
//! Each cluster contributes at most one message: the highest-scoring member
//! that is not a near-duplicate of anything selected so far in this call.

use std::collections::HashMap;

use crate::curator::kmeans::Clustering;
use crate::curator::types::{CuratedMessage, Message};
use crate::curator::window::TimeWindow;
use crate::embedding::cosine_similarity;

/// Cosine similarity above which two messages count as duplicates
pub const DEFAULT_DEDUP_THRESHOLD: f32 = 0.95;

/// Bonus for messages that sit inside a back-and-forth exchange
pub const CONTEXT_BONUS: f32 = 0.1;

/// Default sequence distance searched for a reply from another sender
pub const DEFAULT_CONTEXT_RADIUS: usize = 2;

const CENTROID_WEIGHT: f32 = 0.7;
const LENGTH_WEIGHT: f32 = 0.2;

/// Score a message by its character count.
///
/// Very short messages carry little; very long ones are hard to review.
pub fn length_score(content: &str) -> f32 {
    let len = content.chars().count();
    if len < 5 {
        0.5
    } else if len < 20 {
        0.8
    } else if len <= 500 {
        1.0
    } else if len <= 1000 {
        0.9
    } else {
        0.7
    }
}

/// Combine the scoring factors. The result is not clamped.
pub fn representativeness_score(centroid_similarity: f32, context_bonus: f32, length: f32) -> f32 {
    centroid_similarity * CENTROID_WEIGHT + context_bonus + length * LENGTH_WEIGHT
}

/// Sender lookup by original sequence index
pub struct SenderIndex<'a> {
    by_sequence: HashMap<usize, &'a str>,
}

impl<'a> SenderIndex<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            by_sequence: messages
                .iter()
                .map(|m| (m.sequence, m.sender.as_str()))
                .collect(),
        }
    }

    /// True when a message within `radius` positions has a different sender
    pub fn in_exchange(&self, message: &Message, radius: usize) -> bool {
        let low = message.sequence.saturating_sub(radius);
        let high = message.sequence.saturating_add(radius);
        (low..=high)
            .filter(|&seq| seq != message.sequence)
            .filter_map(|seq| self.by_sequence.get(&seq))
            .any(|sender| *sender != message.sender)
    }

    pub fn context_bonus(&self, message: &Message, radius: usize) -> f32 {
        if self.in_exchange(message, radius) {
            CONTEXT_BONUS
        } else {
            0.0
        }
    }
}

/// Running set of selected embeddings, shared across windows of one call
#[derive(Debug, Clone)]
pub struct DedupSet {
    threshold: f32,
    embeddings: Vec<Vec<f32>>,
}

impl Default for DedupSet {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_THRESHOLD)
    }
}

impl DedupSet {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            embeddings: Vec::new(),
        }
    }

    /// True when `embedding` is more similar than the threshold to anything held
    pub fn is_duplicate(&self, embedding: &[f32]) -> bool {
        self.embeddings
            .iter()
            .any(|selected| cosine_similarity(embedding, selected) > self.threshold)
    }

    pub fn insert(&mut self, embedding: Vec<f32>) {
        self.embeddings.push(embedding);
    }
}

/// A window member with its score
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Position within the window's member list
    slot: usize,
    score: f32,
}

/// Messages picked from one window
#[derive(Debug, Default)]
pub struct WindowSelection {
    pub messages: Vec<CuratedMessage>,
    /// Candidates passed over as near-duplicates
    pub duplicates_skipped: usize,
}

/// Pick one representative per cluster of a downsampled window.
///
/// `embeddings[slot]` belongs to `window.members[slot]` and `clustering` was
/// fitted over those embeddings. Selected embeddings are added to `dedup`.
pub fn select_representatives(
    window: &TimeWindow,
    messages: &[Message],
    embeddings: &[&[f32]],
    clustering: &Clustering,
    senders: &SenderIndex<'_>,
    context_radius: usize,
    dedup: &mut DedupSet,
) -> WindowSelection {
    let mut selection = WindowSelection::default();

    for (cluster, centroid) in clustering.centroids.iter().enumerate() {
        let mut candidates: Vec<Candidate> = clustering
            .members(cluster)
            .map(|slot| {
                let message = &messages[window.members[slot]];
                let score = representativeness_score(
                    cosine_similarity(embeddings[slot], centroid),
                    senders.context_bonus(message, context_radius),
                    length_score(&message.content),
                );
                Candidate { slot, score }
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        for candidate in candidates {
            let embedding = embeddings[candidate.slot];
            if dedup.is_duplicate(embedding) {
                selection.duplicates_skipped += 1;
                continue;
            }

            let message = &messages[window.members[candidate.slot]];
            selection.messages.push(CuratedMessage::from_message(
                message,
                &window.label,
                candidate.score,
            ));
            dedup.insert(embedding.to_vec());
            break;
        }
    }

    selection
}
