//! Top-k retrieval over the chunk index, and the build-or-load cache logic
//! that produces a ready-to-query [`Retriever`].

use anyhow::{Result, bail};
use coderag_context::TextSplitter;
use coderag_embed::EmbeddingProvider;
use std::path::PathBuf;
use std::sync::Arc;

use crate::corpus::PdfPage;
use crate::index::{ChunkIndex, ChunkRecord, EmbeddingModelMetadata};

/// Number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Answers "top-k most similar chunks to this query" lookups.
pub struct Retriever {
    index: ChunkIndex,
    provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("index", &self.index)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    pub fn new(index: ChunkIndex, provider: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            index,
            provider,
            top_k,
        }
    }

    /// Embed the query and return the most similar chunks in descending
    /// similarity order. An empty index yields an empty result, not an
    /// error.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ChunkRecord>> {
        let embedding = self.provider.embed_text(query).await?;
        self.index.search_similar(&embedding, self.top_k).await
    }
}

/// Builds a [`Retriever`] from corpus pages, persisting the embedded index
/// under a cache directory so later runs skip embedding entirely.
///
/// The cache directory name is the base cache path plus a suffix, which
/// keeps variant corpora (default vs custom) in separate caches.
pub struct IndexBuilder {
    cache_base: String,
    provider: Arc<dyn EmbeddingProvider>,
    model: EmbeddingModelMetadata,
    splitter: TextSplitter,
    top_k: usize,
}

impl IndexBuilder {
    pub fn new(
        cache_base: impl Into<String>,
        provider: Arc<dyn EmbeddingProvider>,
        model: EmbeddingModelMetadata,
    ) -> Self {
        Self {
            cache_base: cache_base.into(),
            provider,
            model,
            splitter: TextSplitter::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override the chunking configuration (builder style)
    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Override the number of results per query (builder style)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Cache directory for a given suffix.
    pub fn cache_dir(&self, cache_suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.cache_base, cache_suffix))
    }

    /// Produce a ready-to-query retriever for the given corpus pages.
    ///
    /// If a populated cache exists at the suffixed path, it is loaded as-is
    /// (no embedding calls) after checking that it was built with a
    /// compatible embedding model. Otherwise the pages are chunked,
    /// embedded, and persisted. An empty page set fails hard; there is no
    /// partial-success mode.
    pub async fn build_or_load(&self, pages: &[PdfPage], cache_suffix: &str) -> Result<Retriever> {
        if pages.is_empty() {
            bail!("No PDF documents loaded");
        }

        let cache_dir = self.cache_dir(cache_suffix);

        if ChunkIndex::cache_exists(&cache_dir) {
            let index = ChunkIndex::open(&cache_dir).await?;
            if let Some(stored) = index.model_metadata().await? {
                if !stored.is_compatible_with(&self.model) {
                    bail!(
                        "cache at {} was built with embedding model {}/{} (dimension {}), \
                         which is incompatible with the current model {}/{} (dimension {}); \
                         delete the cache directory to rebuild it",
                        cache_dir.display(),
                        stored.provider,
                        stored.model_name,
                        stored.dimension,
                        self.model.provider,
                        self.model.model_name,
                        self.model.dimension,
                    );
                }
                tracing::info!("Loaded chunk index from cache: {}", cache_dir.display());
                return Ok(Retriever::new(
                    index,
                    Arc::clone(&self.provider),
                    self.top_k,
                ));
            }
            // Database file without a model row: an interrupted build left
            // it unpopulated, so rebuild into it.
            tracing::warn!(
                "Cache at {} has no model metadata, rebuilding",
                cache_dir.display()
            );
            self.build_into(&index, pages).await?;
            return Ok(Retriever::new(
                index,
                Arc::clone(&self.provider),
                self.top_k,
            ));
        }

        tracing::info!("Creating new chunk index at: {}", cache_dir.display());
        let index = ChunkIndex::open(&cache_dir).await?;
        self.build_into(&index, pages).await?;
        Ok(Retriever::new(
            index,
            Arc::clone(&self.provider),
            self.top_k,
        ))
    }

    async fn build_into(&self, index: &ChunkIndex, pages: &[PdfPage]) -> Result<()> {
        let chunks: Vec<_> = pages
            .iter()
            .flat_map(|page| {
                self.splitter
                    .chunk_page(&page.source.to_string_lossy(), page.page, &page.text)
            })
            .collect();

        if chunks.is_empty() {
            bail!("No PDF documents loaded");
        }

        tracing::info!("Embedding {} chunks", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let result = self.provider.embed_texts(&texts).await?;
        if result.len() != chunks.len() {
            bail!(
                "embedding count mismatch: {} chunks but {} embeddings",
                chunks.len(),
                result.len()
            );
        }

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(result.embeddings)
            .map(|(chunk, embedding)| ChunkRecord {
                id: None,
                source: chunk.source,
                page: chunk.page,
                sequence: chunk.sequence,
                content: chunk.text,
                embedding,
            })
            .collect();

        index.register_model(&self.model).await?;
        index.upsert_chunks(&records).await?;
        Ok(())
    }
}
