//! # coderag-embed
//!
//! Text embedding generation for the coderag retrieval pipeline, built on
//! local ONNX models via FastEmbed. Async-first: model inference is
//! synchronous under the hood and is offloaded to blocking tasks.
//!
//! ## Quick Start
//!
//! ```no_run
//! use coderag_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> coderag_embed::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//!
//! let texts = vec!["Hello world".to_string(), "How are you?".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!("Generated {} embeddings of dimension {}",
//!          result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Model selection, batch size and normalization settings
//! - [`provider`]: The [`EmbeddingProvider`] trait and FastEmbed implementation
//! - [`error`]: Error types and result handling
//!
//! Embeddings are half-precision ([`half::f16`]) and L2-normalized by
//! default, so cosine similarity reduces to a dot product downstream.

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
