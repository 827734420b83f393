//! Curation pipeline
//!
//! Runs windowing, budget allocation, gap detection, cluster-and-select and
//! assembly for a single call. The curator keeps no state between calls.

use chrono::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CurationConfig;
use crate::curator::budget::allocate_budgets;
use crate::curator::gaps::{detect_gaps, detect_gaps_from_windows};
use crate::curator::kmeans::{Clustering, KMeans};
use crate::curator::select::{DedupSet, SenderIndex, select_representatives};
use crate::curator::types::{
    CuratedMessage, CurationError, CurationOptions, CurationResult, CurationStats, Message, Result,
};
use crate::curator::window::{TimeWindow, segment_into_windows, window_days_for_span};
use crate::embedding::EmbeddingProvider;

/// Where the curator gets message embeddings from
#[derive(Clone, Copy)]
pub enum EmbeddingSource<'a> {
    /// One vector per message, aligned with the message slice by position
    Precomputed(&'a [Vec<f32>]),
    /// Embed each non-empty window on demand
    Provider(&'a dyn EmbeddingProvider),
}

impl std::fmt::Debug for EmbeddingSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precomputed(vectors) => write!(f, "Precomputed({} vectors)", vectors.len()),
            Self::Provider(provider) => write!(f, "Provider({})", provider.name()),
        }
    }
}

/// Reduces message timelines to a representative, time-balanced subset
#[derive(Debug, Clone, Default)]
pub struct MessageCurator {
    config: CurationConfig,
}

impl MessageCurator {
    pub fn new(config: CurationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    /// Curate `messages` down to at most `options.target_count` messages.
    ///
    /// Messages must be sorted ascending by timestamp. Inputs that already fit
    /// the target come back verbatim. The output can exceed the target only
    /// when the target is smaller than the number of non-empty windows, since
    /// every such window contributes at least one message.
    pub async fn curate(
        &self,
        messages: &[Message],
        source: EmbeddingSource<'_>,
        options: CurationOptions,
        cancel: &CancellationToken,
    ) -> Result<CurationResult> {
        if messages.is_empty() {
            return Ok(CurationResult::empty());
        }

        validate_order(messages)?;
        let mut dimension = None;
        if let EmbeddingSource::Precomputed(vectors) = source {
            if vectors.len() != messages.len() {
                return Err(CurationError::InvalidInput(format!(
                    "{} embeddings supplied for {} messages",
                    vectors.len(),
                    messages.len()
                )));
            }
            check_dimensions(vectors, &mut dimension)?;
        }

        if cancel.is_cancelled() {
            warn!("Curation cancelled before start");
            return Err(CurationError::Cancelled);
        }

        let gap_threshold = Duration::days(self.config.gap_threshold_days);

        if messages.len() <= options.target_count {
            let result = pass_through(messages, gap_threshold);
            info!(
                "Curation passed {} messages through unchanged ({} gaps)",
                messages.len(),
                result.gaps.len()
            );
            return Ok(result);
        }

        let windows = segment_into_windows(messages);
        let budgets = allocate_budgets(&windows, options.target_count);
        let gaps = detect_gaps_from_windows(&windows, gap_threshold);
        let senders = SenderIndex::new(messages);
        let mut dedup = DedupSet::new(self.config.dedup_threshold);

        let mut stats = CurationStats {
            input_count: messages.len(),
            passed_through: false,
            window_days: window_days_for_span(span(messages)),
            window_count: windows.len(),
            non_empty_windows: windows.iter().filter(|w| !w.is_empty()).count(),
            ..Default::default()
        };
        let mut curated: Vec<CuratedMessage> = Vec::with_capacity(options.target_count);

        for (window, &budget) in windows.iter().zip(&budgets) {
            if cancel.is_cancelled() {
                warn!("Curation cancelled at window {}", window.label);
                return Err(CurationError::Cancelled);
            }
            if window.is_empty() {
                continue;
            }

            let fetched;
            let vectors: Vec<&[f32]> = match source {
                EmbeddingSource::Precomputed(all) => {
                    window.members.iter().map(|&i| all[i].as_slice()).collect()
                }
                EmbeddingSource::Provider(provider) => {
                    fetched = embed_window(provider, window, messages, cancel).await?;
                    check_dimensions(&fetched, &mut dimension)?;
                    fetched.iter().map(Vec::as_slice).collect()
                }
            };

            // Kept windows still feed the dedup set so later picks cannot repeat them
            if window.len() <= budget {
                debug!(
                    "Window {}: {} messages within budget {}, keeping all",
                    window.label,
                    window.len(),
                    budget
                );
                for (&i, vector) in window.members.iter().zip(&vectors) {
                    curated.push(CuratedMessage::from_message(&messages[i], &window.label, 1.0));
                    dedup.insert(vector.to_vec());
                }
                continue;
            }

            let clustering = self.cluster(&vectors, budget)?;
            let selection = select_representatives(
                window,
                messages,
                &vectors,
                &clustering,
                &senders,
                self.config.context_radius,
                &mut dedup,
            );

            debug!(
                "Window {}: {} messages, budget {}, {} clusters, selected {}, skipped {} duplicates",
                window.label,
                window.len(),
                budget,
                clustering.k(),
                selection.messages.len(),
                selection.duplicates_skipped
            );

            stats.clustered_windows += 1;
            stats.duplicates_skipped += selection.duplicates_skipped;
            curated.extend(selection.messages);
        }

        curated.sort_by_key(|m| m.timestamp);

        info!(
            "Curated {} of {} messages across {} windows ({} clustered, {} gaps)",
            curated.len(),
            messages.len(),
            stats.non_empty_windows,
            stats.clustered_windows,
            gaps.len()
        );

        Ok(CurationResult {
            messages: curated,
            gaps,
            stats,
        })
    }

    /// Cluster one window's embeddings into at most `budget` groups
    fn cluster(&self, vectors: &[&[f32]], budget: usize) -> Result<Clustering> {
        let k = budget.min(vectors.len());
        if vectors.len() < 3 || k <= 1 {
            return Ok(Clustering::single(vectors));
        }
        KMeans::new(k)
            .with_seed(self.config.kmeans_seed)
            .with_max_iterations(self.config.max_iterations)
            .fit(vectors)
    }
}

/// Return the whole input unchanged, with gaps from a direct scan
fn pass_through(messages: &[Message], gap_threshold: Duration) -> CurationResult {
    let label = match (messages.first(), messages.last()) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.timestamp.format("%Y-%m-%d"),
            last.timestamp.format("%Y-%m-%d")
        ),
        _ => String::new(),
    };

    CurationResult {
        messages: messages
            .iter()
            .map(|m| CuratedMessage::from_message(m, &label, 1.0))
            .collect(),
        gaps: detect_gaps(messages, gap_threshold),
        stats: CurationStats {
            input_count: messages.len(),
            passed_through: true,
            ..Default::default()
        },
    }
}

/// Ask the provider for one window's embeddings, abandoning the call on cancellation
async fn embed_window(
    provider: &dyn EmbeddingProvider,
    window: &TimeWindow,
    messages: &[Message],
    cancel: &CancellationToken,
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = window.messages(messages).map(|m| m.content.clone()).collect();

    let vectors = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Curation cancelled while embedding window {}", window.label);
            return Err(CurationError::Cancelled);
        }
        result = provider.embed(&texts) => {
            result.map_err(|e| CurationError::Embedding(format!("{}: {}", provider.name(), e)))?
        }
    };

    if vectors.len() != texts.len() {
        return Err(CurationError::Embedding(format!(
            "{} returned {} vectors for {} texts",
            provider.name(),
            vectors.len(),
            texts.len()
        )));
    }

    let expected = provider.dimension();
    if let Some(vector) = vectors.iter().find(|v| v.len() != expected) {
        return Err(CurationError::Embedding(format!(
            "{} returned a {}-dimensional vector, expected {}",
            provider.name(),
            vector.len(),
            expected
        )));
    }

    Ok(vectors)
}

fn validate_order(messages: &[Message]) -> Result<()> {
    match messages
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        Some(i) => Err(CurationError::InvalidInput(format!(
            "messages are not sorted by timestamp (position {} precedes {})",
            i + 1,
            i
        ))),
        None => Ok(()),
    }
}

/// Require every vector to share one non-zero dimension, fixed by the first seen
fn check_dimensions(vectors: &[Vec<f32>], expected: &mut Option<usize>) -> Result<()> {
    for vector in vectors {
        if vector.is_empty() {
            return Err(CurationError::InvalidInput(
                "embedding has zero dimension".to_string(),
            ));
        }
        match *expected {
            None => *expected = Some(vector.len()),
            Some(dim) if dim != vector.len() => {
                return Err(CurationError::InvalidInput(format!(
                    "embedding dimension {} does not match {}",
                    vector.len(),
                    dim
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn span(messages: &[Message]) -> Duration {
    match (messages.first(), messages.last()) {
        (Some(first), Some(last)) => last.timestamp - first.timestamp,
        _ => Duration::zero(),
    }
}
