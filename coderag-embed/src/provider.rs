//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use fastembed::{InitOptions, TextEmbedding};
use half::f16;
use std::sync::{Arc, Mutex};

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f16>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of f16 embeddings.
    ///
    /// The dimension is inferred from the first embedding vector; an empty
    /// result has dimension 0.
    pub fn new(embeddings: Vec<Vec<f16>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>>;

    /// Generate embeddings for multiple texts (batch processing)
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;
}

/// FastEmbed-based embedding provider running a local ONNX model.
///
/// The model is loaded once at initialization and shared behind a mutex;
/// fastembed's inference is synchronous, so every call runs inside
/// [`tokio::task::spawn_blocking`].
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Option<Arc<Mutex<TextEmbedding>>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("model", &self.model.is_some())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Create an uninitialized provider. Call [`initialize`](Self::initialize)
    /// before embedding, or use [`create`](Self::create).
    pub fn new(config: EmbedConfig) -> Self {
        Self {
            config,
            model: None,
            dimension: 384, // all-MiniLM-L6-v2 dimension until probed
        }
    }

    /// Load the embedding model. Downloads it on first use via fastembed's
    /// own model cache, then probes the output dimension with a test
    /// embedding.
    pub async fn initialize(&mut self) -> Result<()> {
        tracing::info!("Loading embedding model: {}", self.config.model_name);

        let embedding_model = self.config.embedding_model()?;
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                let init_options =
                    InitOptions::new(embedding_model).with_show_download_progress(true);

                let mut model = TextEmbedding::try_new(init_options)
                    .map_err(|e| EmbedError::External { source: e })?;

                let test_embeddings = model
                    .embed(vec!["test".to_string()], None)
                    .map_err(|e| EmbedError::External { source: e })?;
                let dimension = test_embeddings.first().map(|emb| emb.len()).unwrap_or(384);

                Ok((model, dimension))
            })
            .await??;

        tracing::info!(
            "Embedding model ready: {} (dimension {})",
            self.config.model_name,
            dimension
        );

        self.model = Some(Arc::new(Mutex::new(model)));
        self.dimension = dimension;
        Ok(())
    }

    /// Create and initialize a provider in one step.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        let mut provider = Self::new(config);
        provider.initialize().await?;
        Ok(provider)
    }

    /// Convert f32 embeddings to f16, normalizing if configured.
    fn convert_to_f16(&self, embeddings: Vec<Vec<f32>>) -> Vec<Vec<f16>> {
        embeddings
            .into_iter()
            .map(|embedding| {
                let mut f16_embedding: Vec<f16> =
                    embedding.into_iter().map(f16::from_f32).collect();

                if self.config.normalize {
                    let norm: f32 = f16_embedding
                        .iter()
                        .map(|x| x.to_f32() * x.to_f32())
                        .sum::<f32>()
                        .sqrt();
                    if norm > 0.0 {
                        for value in &mut f16_embedding {
                            *value = f16::from_f32(value.to_f32() / norm);
                        }
                    }
                }

                f16_embedding
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::invalid_config("No embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        let model = self.model.as_ref().ok_or_else(|| {
            EmbedError::invalid_config("Model not initialized. Call initialize() first.")
        })?;

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::new();
        for chunk in texts.chunks(self.config.batch_size) {
            let chunk = chunk.to_vec();
            let model_clone = Arc::clone(model);

            let batch_embeddings = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                let mut model_guard = model_clone.lock().unwrap();
                model_guard
                    .embed(chunk, None)
                    .map_err(|e| EmbedError::External { source: e })
            })
            .await??;

            all_embeddings.extend(self.convert_to_f16(batch_embeddings));
        }

        tracing::debug!("Generated {} embeddings", all_embeddings.len());
        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }
}
