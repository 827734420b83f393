//! Integration tests for the message curator
//!
//! Tests the curator's ability to:
//! - Return small inputs unchanged
//! - Respect the output budget
//! - Keep near-duplicates out of the selection, including repeats of kept windows
//! - Produce identical output for identical input
//! - Fail fast on bad input, provider failure, and cancellation

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use chronicle::config::CurationConfig;
use chronicle::embedding::{EmbeddingProvider, cosine_similarity};
use chronicle::error::Result as ChronicleResult;
use chronicle::curator::segment_into_windows;
use chronicle::testing::{MockEmbeddingProvider, base_time, daily_conversation, topic_embeddings};
use chronicle::{CurationError, CurationOptions, EmbeddingSource, Message, MessageCurator};

// =============================================================================
// Test Providers
// =============================================================================

/// Cancels the run from inside the first embedding call
struct CancellingProvider {
    inner: MockEmbeddingProvider,
    cancel: CancellationToken,
}

#[async_trait]
impl EmbeddingProvider for CancellingProvider {
    async fn embed(&self, texts: &[String]) -> ChronicleResult<Vec<Vec<f32>>> {
        self.cancel.cancel();
        self.inner.embed(texts).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &'static str {
        "cancelling"
    }
}

/// Drops the last vector of every batch
struct ShortProvider;

#[async_trait]
impl EmbeddingProvider for ShortProvider {
    async fn embed(&self, texts: &[String]) -> ChronicleResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .skip(1)
            .map(|t| MockEmbeddingProvider::embed_text(t))
            .collect())
    }

    fn dimension(&self) -> usize {
        384
    }

    fn name(&self) -> &'static str {
        "short"
    }
}

/// Claims 384 dimensions but returns two-dimensional vectors
struct WrongDimensionProvider;

#[async_trait]
impl EmbeddingProvider for WrongDimensionProvider {
    async fn embed(&self, texts: &[String]) -> ChronicleResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimension(&self) -> usize {
        384
    }

    fn name(&self) -> &'static str {
        "wrong-dimension"
    }
}

async fn curate_with_mock(messages: &[Message], target: usize) -> chronicle::CurationResult {
    let provider = MockEmbeddingProvider::new();
    MessageCurator::default()
        .curate(
            messages,
            EmbeddingSource::Provider(&provider),
            CurationOptions::with_target(target),
            &CancellationToken::new(),
        )
        .await
        .expect("curation failed")
}

// =============================================================================
// Pass-through
// =============================================================================

#[tokio::test]
async fn test_pass_through_returns_input_unchanged() {
    let messages = daily_conversation(10, 2, &["Alice", "Bob"]);
    let provider = MockEmbeddingProvider::new();

    let result = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Provider(&provider),
            CurationOptions::with_target(20),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(result.stats.passed_through);
    assert_eq!(result.messages.len(), messages.len());
    for (curated, original) in result.messages.iter().zip(&messages) {
        assert_eq!(curated.id, original.id);
        assert_eq!(curated.content, original.content);
        assert_eq!(curated.timestamp, original.timestamp);
        assert_eq!(curated.representativeness_score, 1.0);
    }
    assert_eq!(provider.calls(), 0, "pass-through must not embed anything");
}

#[tokio::test]
async fn test_pass_through_uses_direct_gap_scan() {
    let mut messages = daily_conversation(2, 2, &["Alice", "Bob"]);
    let later = messages[3].timestamp + chrono::Duration::days(10);
    messages.push(Message::new("Alice", "Back from the trip", later, 4));

    let result = curate_with_mock(&messages, 50).await;
    assert_eq!(result.gaps.len(), 1);
    assert_eq!(result.gaps[0].start, messages[3].timestamp);
    assert_eq!(result.gaps[0].end, later);
}

#[tokio::test]
async fn test_empty_input_gives_empty_result() {
    let result = curate_with_mock(&[], 10).await;
    assert!(result.messages.is_empty());
    assert!(result.gaps.is_empty());
}

// =============================================================================
// Budget
// =============================================================================

#[tokio::test]
async fn test_output_respects_target() {
    let messages = daily_conversation(60, 20, &["Alice", "Bob"]);
    let result = curate_with_mock(&messages, 25).await;

    assert!(result.stats.non_empty_windows <= 25);
    assert!(!result.messages.is_empty());
    assert!(result.messages.len() <= 25);
}

#[tokio::test]
async fn test_output_is_sorted_by_timestamp() {
    let messages = daily_conversation(45, 12, &["Alice", "Bob", "Carol"]);
    let result = curate_with_mock(&messages, 20).await;

    assert!(
        result
            .messages
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    );
}

#[tokio::test]
async fn test_each_window_contributes_when_target_is_tiny() {
    // Nine weekly windows but a target of three: every window still gets one slot
    let messages = daily_conversation(60, 20, &["Alice", "Bob"]);
    let result = curate_with_mock(&messages, 3).await;

    assert_eq!(result.stats.non_empty_windows, 9);
    assert_eq!(result.messages.len(), 9);
}

#[tokio::test]
async fn test_sparse_window_is_kept_whole() {
    // A busy first week followed by two messages in the second week
    let mut messages = daily_conversation(5, 8, &["Alice", "Bob"]);
    let sparse_start = base_time() + chrono::Duration::days(9);
    messages.push(Message::new("Alice", "Landed, call you later", sparse_start, 40));
    messages.push(Message::new(
        "Bob",
        "Welcome back!",
        sparse_start + chrono::Duration::hours(1),
        41,
    ));
    let windows = segment_into_windows(&messages);
    let provider = MockEmbeddingProvider::new();

    let result = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Provider(&provider),
            CurationOptions::with_target(40),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!result.stats.passed_through);
    assert_eq!(result.stats.non_empty_windows, 2);
    assert_eq!(result.stats.clustered_windows, 1);
    assert_eq!(provider.calls(), 2);

    for sequence in [40, 41] {
        let kept = result
            .messages
            .iter()
            .find(|m| m.sequence == sequence)
            .expect("sparse message missing");
        assert_eq!(kept.representativeness_score, 1.0);
        assert_eq!(kept.window_label, windows[1].label);
    }
    assert!(result.messages.len() <= 40);
}

// =============================================================================
// Deduplication
// =============================================================================

#[tokio::test]
async fn test_selected_messages_are_not_near_duplicates() {
    let messages = daily_conversation(60, 20, &["Alice", "Bob"]);
    let embeddings = topic_embeddings(&messages, 5);

    let result = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Precomputed(&embeddings),
            CurationOptions::with_target(40),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // Five tight topics leave room for at most one message each
    assert!(!result.messages.is_empty());
    assert!(result.messages.len() <= 5);
    assert!(result.stats.duplicates_skipped > 0);

    let selected: Vec<&Vec<f32>> = result
        .messages
        .iter()
        .map(|m| &embeddings[m.sequence])
        .collect();
    for (i, a) in selected.iter().enumerate() {
        for b in &selected[i + 1..] {
            assert!(cosine_similarity(a, b) <= 0.95);
        }
    }
}

#[tokio::test]
async fn test_kept_window_blocks_later_duplicates() {
    // One message in the first week, then a week of two repeated topics
    let mut messages = vec![Message::new("Alice", "Morning run done", base_time(), 0)];
    let mut embeddings = vec![vec![1.0, 0.0, 0.0]];
    let second_week = base_time() + chrono::Duration::days(7);
    for i in 0..10 {
        let sender = if i % 2 == 0 { "Alice" } else { "Bob" };
        let timestamp = second_week + chrono::Duration::hours(i as i64);
        messages.push(Message::new(sender, format!("Update number {i}"), timestamp, i + 1));
        embeddings.push(if i < 5 {
            vec![1.0, 0.0, 0.0]
        } else {
            vec![0.0, 1.0, 0.0]
        });
    }

    let result = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Precomputed(&embeddings),
            CurationOptions::with_target(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // The first week fits its budget of one and is kept whole
    assert_eq!(result.messages[0].sequence, 0);
    assert_eq!(result.messages[0].representativeness_score, 1.0);
    assert!(
        result.messages[1..].iter().all(|m| m.sequence > 5),
        "second week repeated the kept topic"
    );
    assert!(result.stats.duplicates_skipped >= 5);

    for (i, a) in result.messages.iter().enumerate() {
        for b in &result.messages[i + 1..] {
            assert!(cosine_similarity(&embeddings[a.sequence], &embeddings[b.sequence]) <= 0.95);
        }
    }
}

#[tokio::test]
async fn test_dedup_threshold_comes_from_config() {
    let messages = daily_conversation(60, 20, &["Alice", "Bob"]);
    let embeddings = topic_embeddings(&messages, 5);
    let curator = MessageCurator::new(CurationConfig {
        dedup_threshold: 1.0,
        ..Default::default()
    });

    let result = curator
        .curate(
            &messages,
            EmbeddingSource::Precomputed(&embeddings),
            CurationOptions::with_target(40),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // Nothing is more similar than 1.0, so only the budget limits the output
    assert_eq!(result.stats.duplicates_skipped, 0);
    assert!(result.messages.len() > 5);
}

// =============================================================================
// Determinism
// =============================================================================

#[tokio::test]
async fn test_identical_input_gives_identical_output() {
    let messages = daily_conversation(40, 15, &["Alice", "Bob"]);

    let first = curate_with_mock(&messages, 18).await;
    let second = curate_with_mock(&messages, 18).await;

    let summarize = |r: &chronicle::CurationResult| -> Vec<(usize, u32)> {
        r.messages
            .iter()
            .map(|m| (m.sequence, m.representativeness_score.to_bits()))
            .collect()
    };
    assert_eq!(summarize(&first), summarize(&second));
    assert_eq!(first.gaps, second.gaps);
}

#[tokio::test]
async fn test_windows_cluster_independently_of_seed_state() {
    // A window's picks must not depend on how many windows came before it
    let messages = daily_conversation(28, 10, &["Alice", "Bob"]);
    let late: Vec<Message> = messages[140..]
        .iter()
        .enumerate()
        .map(|(i, m)| Message {
            sequence: i,
            ..m.clone()
        })
        .collect();

    let full = curate_with_mock(&messages, 12).await;
    let tail = curate_with_mock(&late, 6).await;

    let by_id: HashMap<_, _> = full.messages.iter().map(|m| (m.id, m.sequence)).collect();
    let tail_ids: Vec<_> = tail.messages.iter().map(|m| m.id).collect();
    assert!(tail_ids.iter().all(|id| by_id.contains_key(id)));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_unsorted_input_is_rejected() {
    let mut messages = daily_conversation(3, 3, &["Alice"]);
    messages.reverse();

    let provider = MockEmbeddingProvider::new();
    let err = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Provider(&provider),
            CurationOptions::with_target(2),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CurationError::InvalidInput(_)));
}

#[tokio::test]
async fn test_provider_failure_aborts_curation() {
    let messages = daily_conversation(14, 10, &["Alice", "Bob"]);
    let provider = MockEmbeddingProvider::failing();

    let err = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Provider(&provider),
            CurationOptions::with_target(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CurationError::Embedding(_)));
    assert_eq!(provider.calls(), 1, "no retries after a failure");
}

#[tokio::test]
async fn test_provider_with_wrong_vector_count_is_rejected() {
    let messages = daily_conversation(14, 10, &["Alice", "Bob"]);

    let err = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Provider(&ShortProvider),
            CurationOptions::with_target(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CurationError::Embedding(_)));
}

#[tokio::test]
async fn test_provider_with_wrong_dimension_is_rejected() {
    let messages = daily_conversation(14, 10, &["Alice", "Bob"]);

    let err = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Provider(&WrongDimensionProvider),
            CurationOptions::with_target(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CurationError::Embedding(_)));
}

#[tokio::test]
async fn test_cancellation_mid_run_discards_output() {
    let messages = daily_conversation(28, 10, &["Alice", "Bob"]);
    let cancel = CancellationToken::new();
    let provider = CancellingProvider {
        inner: MockEmbeddingProvider::new(),
        cancel: cancel.clone(),
    };

    let err = MessageCurator::default()
        .curate(
            &messages,
            EmbeddingSource::Provider(&provider),
            CurationOptions::with_target(8),
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CurationError::Cancelled));
    assert_eq!(provider.inner.calls(), 1);
}
