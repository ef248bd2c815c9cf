//! # coderag-retriever
//!
//! Corpus-side plumbing for retrieval-augmented code review: PDF corpus
//! discovery and per-page text extraction, a SQLite-backed chunk index that
//! doubles as the on-disk embedding cache, and the top-k [`Retriever`] the
//! analyzer queries.
//!
//! ## Modules
//!
//! - [`corpus`]: finding PDF files and extracting page text
//! - [`index`]: the persisted chunk index (storage, model metadata,
//!   similarity search)
//! - [`retriever`]: [`IndexBuilder`] (build-or-load cache protocol) and
//!   [`Retriever`] (top-k queries)
//!
//! The cache is a local-trust artifact: nothing verifies the database file
//! beyond the embedding-model compatibility check performed on load.

pub mod corpus;
pub mod index;
pub mod retriever;

pub use corpus::{FALLBACK_PDF_FILES, PdfPage, default_pdf_files, load_corpus, pdf_files_in_folder};
pub use index::{ChunkIndex, ChunkRecord, EmbeddingModelMetadata};
pub use retriever::{DEFAULT_TOP_K, IndexBuilder, Retriever};
