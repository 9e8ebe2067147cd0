//! # Provider Selection
//!
//! Builds the embedding provider from configuration, with automatic fallback
//! from the neural checkpoint to hash embedding when no usable model is
//! available.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embed::{DEFAULT_DIMENSION, Embedder, HashEmbedder, MiniLmEmbedder};
use crate::error::{EmbedError, Result};

/// Which provider to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Try the neural checkpoint, fall back to hash embedding with a warning.
    Auto,
    /// Require the neural checkpoint; fail if it cannot be loaded.
    Neural,
    /// Always use hash embedding.
    Hash,
}

impl std::fmt::Display for EmbedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbedMode::Auto => write!(f, "auto"),
            EmbedMode::Neural => write!(f, "neural"),
            EmbedMode::Hash => write!(f, "hash"),
        }
    }
}

impl std::str::FromStr for EmbedMode {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(EmbedMode::Auto),
            "neural" => Ok(EmbedMode::Neural),
            "hash" => Ok(EmbedMode::Hash),
            other => Err(EmbedError::ModelLoad(format!(
                "unknown embed mode {other:?} (expected auto, neural, or hash)"
            ))),
        }
    }
}

/// Configuration for provider construction.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Provider selection strategy.
    pub mode: EmbedMode,
    /// Directory holding `config.json`, `tokenizer.json`, `model.safetensors`.
    pub model_dir: Option<PathBuf>,
    /// Vector dimension for the hash provider.
    pub hash_dimension: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            mode: EmbedMode::Auto,
            model_dir: None,
            hash_dimension: DEFAULT_DIMENSION,
        }
    }
}

impl EmbedConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider selection mode.
    pub fn with_mode(mut self, mode: EmbedMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the model checkpoint directory.
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    /// Set the hash provider dimension. Clamped to at least 1.
    pub fn with_hash_dimension(mut self, dimension: usize) -> Self {
        self.hash_dimension = dimension.max(1);
        self
    }
}

/// Builds the configured provider.
///
/// `Auto` prefers the neural checkpoint when a model directory is configured
/// and loadable, and otherwise degrades to hash embedding. The degradation is
/// logged: a hash-built index answers queries, just without semantic quality.
pub fn build_embedder(config: &EmbedConfig) -> Result<Arc<dyn Embedder>> {
    match config.mode {
        EmbedMode::Hash => Ok(Arc::new(HashEmbedder::new(config.hash_dimension))),
        EmbedMode::Neural => {
            let dir = config.model_dir.as_ref().ok_or_else(|| {
                EmbedError::ModelLoad("neural mode requires a model directory".into())
            })?;
            Ok(Arc::new(MiniLmEmbedder::load(dir)?))
        }
        EmbedMode::Auto => {
            if let Some(dir) = &config.model_dir {
                match MiniLmEmbedder::load(dir) {
                    Ok(embedder) => return Ok(Arc::new(embedder)),
                    Err(e) => {
                        tracing::warn!(
                            model_dir = %dir.display(),
                            error = %e,
                            "neural embedder unavailable, falling back to hash embedding"
                        );
                    }
                }
            } else {
                tracing::debug!("no model directory configured, using hash embedding");
            }
            Ok(Arc::new(HashEmbedder::new(config.hash_dimension)))
        }
    }
}
