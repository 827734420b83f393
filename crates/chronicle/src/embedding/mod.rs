//! Embedding collaborator seam and vector helpers
//!
//! The curator never computes embeddings itself. It either receives vectors
//! precomputed by the caller or asks an [`EmbeddingProvider`] for them one
//! window at a time.

#[cfg(feature = "fastembed")]
pub mod fastembed_provider;
pub mod vector;

use async_trait::async_trait;

use crate::error::Result;

#[cfg(feature = "fastembed")]
pub use fastembed_provider::FastEmbedProvider;
pub use vector::{cosine_similarity, l2_normalize, normalized_mean};

/// Dimension of the reference embedding models (e5-small, MiniLM, bge-small)
pub const EMBEDDING_DIMENSION: usize = 384;

/// Trait for text embedding backends
///
/// Implementations must return exactly one vector per input text, in input
/// order, all of the same dimension and L2-normalized. An empty input yields
/// an empty output.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimension of the vectors this provider produces
    fn dimension(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
