//! Local embedding provider backed by fastembed
//!
//! Runs an ONNX sentence-embedding model in-process. Inference is blocking,
//! so each call is moved onto tokio's blocking pool.

use std::sync::{Arc, Mutex};

use ::fastembed::{EmbeddingModel as FastEmbedModel, InitOptions, TextEmbedding};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::EmbeddingConfig;
use crate::embedding::{EMBEDDING_DIMENSION, EmbeddingProvider, l2_normalize};
use crate::error::{ChronicleError, Result};

/// Embedding provider running a fastembed text model locally
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    batch_size: usize,
}

impl FastEmbedProvider {
    /// Load the model named in the configuration.
    ///
    /// Downloads model files on first use, which may take a while.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let kind = model_from_name(&config.model)?;

        let mut options =
            InitOptions::new(kind).with_show_download_progress(config.show_download_progress);
        if let Some(dir) = &config.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        let model =
            TextEmbedding::try_new(options).map_err(|e| ChronicleError::Embedding(e.to_string()))?;

        info!("FastEmbedProvider initialized with model: {}", config.model);

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            batch_size: config.batch_size.max(1),
        })
    }
}

/// Map a configured model name to the fastembed model enum
fn model_from_name(name: &str) -> Result<FastEmbedModel> {
    match name.to_ascii_lowercase().as_str() {
        "multilingual-e5-small" => Ok(FastEmbedModel::MultilingualE5Small),
        "all-minilm-l6-v2" => Ok(FastEmbedModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(FastEmbedModel::BGESmallENV15),
        other => Err(ChronicleError::Config(format!(
            "Unsupported embedding model '{other}'. Use multilingual-e5-small, all-minilm-l6-v2, or bge-small-en-v1.5."
        ))),
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts", texts.len());

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let batch_size = self.batch_size;

        let mut embeddings = tokio::task::spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|_| ChronicleError::Embedding("Embedding model lock poisoned".into()))?;
            guard
                .embed(texts, Some(batch_size))
                .map_err(|e| ChronicleError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| ChronicleError::Embedding(format!("Embedding task failed: {e}")))??;

        for v in embeddings.iter_mut() {
            l2_normalize(v);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    fn name(&self) -> &'static str {
        "fastembed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_from_name() {
        assert!(matches!(
            model_from_name("multilingual-e5-small"),
            Ok(FastEmbedModel::MultilingualE5Small)
        ));
        assert!(matches!(
            model_from_name("All-MiniLM-L6-v2"),
            Ok(FastEmbedModel::AllMiniLML6V2)
        ));
        assert!(matches!(
            model_from_name("bge-small-en-v1.5"),
            Ok(FastEmbedModel::BGESmallENV15)
        ));
    }

    #[test]
    fn test_model_from_name_unknown() {
        let err = model_from_name("word2vec").unwrap_err();
        assert!(matches!(err, ChronicleError::Config(_)));
        assert!(err.to_string().contains("word2vec"));
    }

    #[cfg(feature = "ml-tests")]
    #[tokio::test]
    async fn test_embeddings_are_unit_length() {
        let provider =
            FastEmbedProvider::new(&EmbeddingConfig::default()).expect("Failed to load model");
        let texts = vec!["Dinner at eight?".to_string(), "Sure, see you then".to_string()];
        let embeddings = provider.embed(&texts).await.expect("Failed to embed");

        assert_eq!(embeddings.len(), 2);
        for emb in &embeddings {
            assert_eq!(emb.len(), EMBEDDING_DIMENSION);
            let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-3, "Expected unit norm, got {norm}");
        }
    }
}
