pub mod text;

// Re-export the main chunking types for external use
pub use text::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, TextChunk, TextSplitter};
