//! Test utilities for chronicle - mock embedder and conversation fixtures
//!
//! This module provides utilities for fast, model-free tests:
//! - A deterministic mock embedding provider
//! - Generators for synthetic conversations and aligned embeddings

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::curator::Message;
use crate::embedding::{EMBEDDING_DIMENSION, EmbeddingProvider, l2_normalize};
use crate::error::{ChronicleError, Result};

/// Mock embedding provider for tests that don't need real ML.
/// Produces deterministic 384-dimensional unit vectors from a hash of the text.
#[derive(Debug, Default)]
pub struct MockEmbeddingProvider {
    fail: bool,
    calls: AtomicUsize,
    texts_embedded: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Generate a deterministic "embedding" from text using hashing.
    pub fn embed_text(text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut vector: Vec<f32> = (0..EMBEDDING_DIMENSION)
            .map(|i| {
                // Use seed + index to generate pseudo-random but deterministic values
                let x = seed
                    .wrapping_mul(i as u64 + 1)
                    .wrapping_add(0x9e3779b97f4a7c15);
                let normalized = (x as f32) / (u64::MAX as f32);
                (normalized * 2.0) - 1.0
            })
            .collect();
        l2_normalize(&mut vector);
        vector
    }

    /// Number of `embed` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total number of texts passed to `embed` so far
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ChronicleError::Embedding("mock provider failure".to_string()));
        }
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Start of every generated conversation: 2024-01-01 08:00 UTC
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A conversation with `per_day` messages on each of `days` consecutive days.
///
/// Messages of one day are spread over twelve hours and senders rotate in
/// order. Sequence indices follow list order.
pub fn daily_conversation(days: usize, per_day: usize, senders: &[&str]) -> Vec<Message> {
    let step = Duration::seconds(12 * 3600 / per_day.max(1) as i64);
    let mut messages = Vec::with_capacity(days * per_day);

    for day in 0..days {
        for slot in 0..per_day {
            let sequence = messages.len();
            let sender = senders
                .get(sequence % senders.len().max(1))
                .copied()
                .unwrap_or("Alice");
            let timestamp = base_time() + Duration::days(day as i64) + step * slot as i32;
            let content = format!("Message {sequence} from {sender} on day {day} about plans");
            messages.push(Message::new(sender, content, timestamp, sequence));
        }
    }

    messages
}

/// One message per entry of `days`, each at 08:00 on that day offset
pub fn messages_on_days(days: &[i64]) -> Vec<Message> {
    days.iter()
        .enumerate()
        .map(|(i, &day)| {
            let sender = if i % 2 == 0 { "Alice" } else { "Bob" };
            Message::new(
                sender,
                format!("Check-in number {i} on day {day}"),
                base_time() + Duration::days(day),
                i,
            )
        })
        .collect()
}

/// Embeddings aligned with `messages`, drawn from `topics` tight topic groups.
///
/// Message `i` belongs to topic `i % topics`. Two messages of the same topic
/// have cosine similarity of at least 0.99; messages of different topics are
/// close to orthogonal.
pub fn topic_embeddings(messages: &[Message], topics: usize) -> Vec<Vec<f32>> {
    let topics = topics.clamp(1, EMBEDDING_DIMENSION - 8);
    (0..messages.len())
        .map(|i| {
            let mut vector = vec![0.0_f32; EMBEDDING_DIMENSION];
            vector[i % topics] = 1.0;
            vector[topics + i % 7] = 0.1;
            l2_normalize(&mut vector);
            vector
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn mock_embedding_is_deterministic() {
        let emb1 = MockEmbeddingProvider::embed_text("hello world");
        let emb2 = MockEmbeddingProvider::embed_text("hello world");
        assert_eq!(emb1, emb2);
    }

    #[test]
    fn mock_embedding_is_unit_length() {
        let emb = MockEmbeddingProvider::embed_text("test");
        assert_eq!(emb.len(), EMBEDDING_DIMENSION);
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn mock_provider_counts_calls() {
        let provider = MockEmbeddingProvider::new();
        let texts = vec!["a".to_string(), "b".to_string()];
        let vectors = provider.embed(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.texts_embedded(), 2);
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let provider = MockEmbeddingProvider::failing();
        let result = provider.embed(&["a".to_string()]).await;
        assert!(matches!(result, Err(ChronicleError::Embedding(_))));
    }

    #[test]
    fn daily_conversation_is_sorted() {
        let messages = daily_conversation(5, 90, &["Alice", "Bob"]);
        assert_eq!(messages.len(), 450);
        assert!(messages.windows(2).all(|p| p[0].timestamp <= p[1].timestamp));
        assert_eq!(messages[1].sender, "Bob");
        assert_eq!(messages[449].sequence, 449);
    }

    #[test]
    fn topic_embeddings_group_by_topic() {
        let messages = daily_conversation(1, 10, &["Alice"]);
        let embeddings = topic_embeddings(&messages, 3);

        assert!(cosine_similarity(&embeddings[0], &embeddings[3]) > 0.95);
        assert!(cosine_similarity(&embeddings[0], &embeddings[1]) < 0.1);
    }
}
