//! Configuration for embedding models

use crate::error::{EmbedError, Result};
use fastembed::EmbeddingModel;
use serde::{Deserialize, Serialize};

/// Default embedding model, a small sentence-transformer suitable for
/// paragraph-sized chunks.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Configuration for embedding models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Name of the embedding model to use
    pub model_name: String,
    /// Maximum batch size for embedding generation
    pub batch_size: usize,
    /// Whether to L2-normalize embeddings
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            batch_size: 16,
            normalize: true,
        }
    }
}

impl EmbedConfig {
    /// Create a configuration for a named model with default settings.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }

    /// Resolve the configured model name to a fastembed built-in model.
    pub fn embedding_model(&self) -> Result<EmbeddingModel> {
        match self.model_name.as_str() {
            "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
            "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            other => Err(EmbedError::invalid_config(format!(
                "Unknown embedding model: {other}"
            ))),
        }
    }
}
