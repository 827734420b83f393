use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ChronicleError, Result};

/// Main configuration structure for Chronicle
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Curation engine tuning
    #[serde(default)]
    pub curation: CurationConfig,
    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Load configuration from an explicit path, or from the first default
    /// location that exists, falling back to built-in defaults.
    ///
    /// Default locations, in order:
    /// - `~/.chronicle/config.toml`
    /// - `<config_dir>/chronicle/config.toml`
    /// - `./config.toml`
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".chronicle").join("config.toml")),
            dirs::config_dir().map(|c| c.join("chronicle").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChronicleError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ChronicleError::Config(format!("Failed to parse config: {e}")))?;
        config.curation.validate()?;
        Ok(config)
    }
}

/// Tuning for the curation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Default maximum number of curated messages per call
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    /// Cosine similarity above which a candidate counts as a duplicate
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f32,
    /// Seed for k-means++ centroid sampling
    #[serde(default = "default_kmeans_seed")]
    pub kmeans_seed: u64,
    /// Maximum k-means refinement rounds per window
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Minimum silence, in days, reported as a communication gap
    #[serde(default = "default_gap_threshold_days")]
    pub gap_threshold_days: i64,
    /// Sequence distance searched for a reply from another sender
    #[serde(default = "default_context_radius")]
    pub context_radius: usize,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            dedup_threshold: default_dedup_threshold(),
            kmeans_seed: default_kmeans_seed(),
            max_iterations: default_max_iterations(),
            gap_threshold_days: default_gap_threshold_days(),
            context_radius: default_context_radius(),
        }
    }
}

impl CurationConfig {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.dedup_threshold > 0.0 && self.dedup_threshold <= 1.0) {
            return Err(ChronicleError::Config(format!(
                "dedup_threshold must be in (0, 1], got {}",
                self.dedup_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(ChronicleError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.gap_threshold_days <= 0 {
            return Err(ChronicleError::Config(format!(
                "gap_threshold_days must be positive, got {}",
                self.gap_threshold_days
            )));
        }
        Ok(())
    }
}

fn default_target_count() -> usize {
    200
}

fn default_dedup_threshold() -> f32 {
    0.95
}

fn default_kmeans_seed() -> u64 {
    42
}

fn default_max_iterations() -> usize {
    20
}

fn default_gap_threshold_days() -> i64 {
    7
}

fn default_context_radius() -> usize {
    2
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name understood by the fastembed provider
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Batch size handed to the model per inference call
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
    /// Directory for downloaded model files (fastembed default when unset)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Show a progress bar while model files download
    #[serde(default)]
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_embedding_batch_size(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

fn default_embedding_model() -> String {
    "multilingual-e5-small".to_string()
}

fn default_embedding_batch_size() -> usize {
    32
}
