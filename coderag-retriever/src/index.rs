//! SQLite-backed chunk index: the on-disk cache for embedded corpus chunks.
//!
//! The index is a single SQLite database file inside a cache directory. It
//! stores every chunk's text, provenance, and f16 embedding blob, plus one
//! row describing the embedding model that produced the vectors. An index is
//! either built wholesale from a consistent chunk set or loaded wholesale
//! from a prior run; there are no partial updates.
//!
//! ```sql
//! CREATE TABLE chunks (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     source TEXT NOT NULL,        -- originating PDF path
//!     page INTEGER NOT NULL,       -- 1-based page number
//!     sequence INTEGER NOT NULL,   -- chunk position within the page
//!     content TEXT NOT NULL,       -- chunk text
//!     embedding BLOB NOT NULL,     -- f16 embedding vector
//!     created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
//! );
//!
//! CREATE TABLE embedding_model (   -- single row, id = 1
//!     model_name TEXT, provider TEXT, dimension INTEGER,
//!     normalized BOOLEAN, created_at INTEGER
//! );
//! ```
//!
//! The cache is local-trust only: no checksum protects the file, but the
//! recorded model row lets [`ChunkIndex::model_metadata`] callers refuse a
//! cache built by an incompatible embedding model.

use anyhow::{Context, Result};
use half::f16;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the database file inside a cache directory.
pub const INDEX_DB_FILE: &str = "chunks.db";

/// Metadata about the embedding model used for generating embeddings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingModelMetadata {
    /// Name of the embedding model (e.g., "all-MiniLM-L6-v2")
    pub model_name: String,
    /// Provider of the embedding model (e.g., "fastembed")
    pub provider: String,
    /// Dimension of the embedding vectors
    pub dimension: usize,
    /// Whether embeddings are L2-normalized
    pub normalized: bool,
}

impl EmbeddingModelMetadata {
    pub fn new(model_name: impl Into<String>, provider: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_name: model_name.into(),
            provider: provider.into(),
            dimension,
            normalized: false,
        }
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Whether vectors produced under `other` can be compared with vectors
    /// produced under `self`.
    pub fn is_compatible_with(&self, other: &EmbeddingModelMetadata) -> bool {
        self.model_name == other.model_name
            && self.provider == other.provider
            && self.dimension == other.dimension
            && self.normalized == other.normalized
    }
}

/// One embedded chunk as stored in the index.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: Option<i64>,
    /// Originating PDF path
    pub source: String,
    /// 1-based page number within the source
    pub page: u32,
    /// Chunk position within the page
    pub sequence: usize,
    /// Chunk text
    pub content: String,
    /// f16 embedding vector
    pub embedding: Vec<f16>,
}

/// SQLite-backed storage for embedded chunks.
#[derive(Clone, Debug)]
pub struct ChunkIndex {
    pool: SqlitePool,
}

impl ChunkIndex {
    /// Path of the database file for a given cache directory.
    pub fn db_path(cache_dir: &Path) -> PathBuf {
        cache_dir.join(INDEX_DB_FILE)
    }

    /// Whether a cache already exists at `cache_dir`.
    pub fn cache_exists(cache_dir: &Path) -> bool {
        Self::db_path(cache_dir).exists()
    }

    /// Open (creating if missing) the index inside `cache_dir`.
    pub async fn open(cache_dir: &Path) -> Result<Self> {
        fs::create_dir_all(cache_dir)
            .with_context(|| format!("creating cache directory {}", cache_dir.display()))?;

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(Self::db_path(cache_dir))
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .create_if_missing(true)
                .page_size(1 << 16),
        )
        .await?;
        Self::new_with_pool(pool).await
    }

    /// Open an in-memory index (for testing).
    pub async fn open_memory() -> Result<Self> {
        // One connection only: each sqlite in-memory connection is its own
        // database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::new_with_pool(pool).await
    }

    async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_tables(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                page INTEGER NOT NULL,
                sequence INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT unique_chunk UNIQUE(source, page, sequence)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS embedding_model (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                model_name TEXT NOT NULL,
                provider TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                normalized BOOLEAN NOT NULL DEFAULT FALSE,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Insert or update a batch of chunks in one transaction.
    pub async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for chunk in chunks {
            let embedding_bytes = bytemuck::cast_slice::<f16, u8>(&chunk.embedding);
            sqlx::query(
                r#"
                INSERT INTO chunks (source, page, sequence, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(source, page, sequence) DO UPDATE SET
                    content = excluded.content,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&chunk.source)
            .bind(chunk.page as i64)
            .bind(chunk.sequence as i64)
            .bind(&chunk.content)
            .bind(embedding_bytes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Number of chunks stored in the index.
    pub async fn chunk_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Record the embedding model this index was built with.
    pub async fn register_model(&self, model: &EmbeddingModelMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO embedding_model (id, model_name, provider, dimension, normalized, created_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                model_name = excluded.model_name,
                provider = excluded.provider,
                dimension = excluded.dimension,
                normalized = excluded.normalized,
                created_at = excluded.created_at
            "#,
        )
        .bind(&model.model_name)
        .bind(&model.provider)
        .bind(model.dimension as i64)
        .bind(model.normalized)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The embedding model recorded at build time, if any.
    pub async fn model_metadata(&self) -> Result<Option<EmbeddingModelMetadata>> {
        let row = sqlx::query("SELECT * FROM embedding_model WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| EmbeddingModelMetadata {
            model_name: row.get("model_name"),
            provider: row.get("provider"),
            dimension: row.get::<i64, _>("dimension") as usize,
            normalized: row.get("normalized"),
        }))
    }

    /// Brute-force cosine similarity search over all stored chunks,
    /// returning the `limit` most similar in descending order.
    pub async fn search_similar(&self, query: &[f16], limit: usize) -> Result<Vec<ChunkRecord>> {
        let rows = sqlx::query(
            "SELECT id, source, page, sequence, content, embedding FROM chunks ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut similarities: Vec<(f32, ChunkRecord)> = Vec::new();
        for row in rows {
            let embedding_bytes: Vec<u8> = row.get("embedding");
            let embedding: Vec<f16> = bytemuck::cast_slice::<u8, f16>(&embedding_bytes).to_vec();
            let similarity = cosine_similarity(query, &embedding);

            similarities.push((
                similarity,
                ChunkRecord {
                    id: Some(row.get("id")),
                    source: row.get("source"),
                    page: row.get::<i64, _>("page") as u32,
                    sequence: row.get::<i64, _>("sequence") as usize,
                    content: row.get("content"),
                    embedding,
                },
            ));
        }

        similarities.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        similarities.truncate(limit);

        Ok(similarities.into_iter().map(|(_, chunk)| chunk).collect())
    }
}

/// Cosine similarity between two f16 embedding vectors.
fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f32::from(*x) * f32::from(*y))
        .sum();

    let norm_a: f32 = a.iter().map(|x| f32::from(*x).powi(2)).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| f32::from(*x).powi(2)).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed(values: &[f32]) -> Vec<f16> {
        values.iter().copied().map(f16::from_f32).collect()
    }

    fn record(source: &str, sequence: usize, content: &str, embedding: &[f32]) -> ChunkRecord {
        ChunkRecord {
            id: None,
            source: source.to_string(),
            page: 1,
            sequence,
            content: content.to_string(),
            embedding: embed(embedding),
        }
    }

    #[tokio::test]
    async fn chunks_roundtrip() -> Result<()> {
        let index = ChunkIndex::open_memory().await?;
        assert_eq!(index.chunk_count().await?, 0);

        index
            .upsert_chunks(&[
                record("a.pdf", 0, "first", &[1.0, 0.0]),
                record("a.pdf", 1, "second", &[0.0, 1.0]),
            ])
            .await?;
        assert_eq!(index.chunk_count().await?, 2);

        // Upserting the same provenance replaces instead of duplicating.
        index
            .upsert_chunks(&[record("a.pdf", 0, "first edited", &[1.0, 0.0])])
            .await?;
        assert_eq!(index.chunk_count().await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn search_orders_by_similarity() -> Result<()> {
        let index = ChunkIndex::open_memory().await?;
        index
            .upsert_chunks(&[
                record("a.pdf", 0, "orthogonal", &[0.0, 1.0]),
                record("a.pdf", 1, "exact", &[1.0, 0.0]),
                record("a.pdf", 2, "close", &[0.9, 0.1]),
            ])
            .await?;

        let results = index.search_similar(&embed(&[1.0, 0.0]), 2).await?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "exact");
        assert_eq!(results[1].content, "close");

        Ok(())
    }

    #[tokio::test]
    async fn search_on_empty_index_returns_nothing() -> Result<()> {
        let index = ChunkIndex::open_memory().await?;
        let results = index.search_similar(&embed(&[1.0, 0.0]), 5).await?;
        assert!(results.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn model_metadata_roundtrip() -> Result<()> {
        let index = ChunkIndex::open_memory().await?;
        assert!(index.model_metadata().await?.is_none());

        let model = EmbeddingModelMetadata::new("all-MiniLM-L6-v2", "fastembed", 384)
            .with_normalized(true);
        index.register_model(&model).await?;

        let stored = index.model_metadata().await?.unwrap();
        assert_eq!(stored, model);
        assert!(stored.is_compatible_with(&model));

        let other = EmbeddingModelMetadata::new("all-MiniLM-L6-v2", "fastembed", 768)
            .with_normalized(true);
        assert!(!stored.is_compatible_with(&other));

        Ok(())
    }

    #[test]
    fn cosine_similarity_basics() {
        let a = embed(&[1.0, 0.0]);
        let b = embed(&[0.0, 1.0]);
        let c = embed(&[1.0, 0.0]);

        assert!((cosine_similarity(&a, &c) - 1.0).abs() < 1e-3);
        assert!(cosine_similarity(&a, &b).abs() < 1e-3);
        // Mismatched dimensions and zero vectors degrade to 0.
        assert_eq!(cosine_similarity(&a, &embed(&[1.0])), 0.0);
        assert_eq!(cosine_similarity(&a, &embed(&[0.0, 0.0])), 0.0);
    }
}
