//! Fixed-size overlapping text chunking for retrieval.
//!
//! This module turns extracted document text into bounded-length "chunks"
//! suitable for embedding and similarity search. Each chunk carries
//! provenance (the source document and page it came from, plus its position
//! within that page) so retrieval results can be traced back to the corpus.
//!
//! The splitting strategy is a character window: chunks are at most
//! `chunk_size` characters long and consecutive chunks share `overlap`
//! characters, so no sentence straddling a boundary is lost entirely from
//! both sides. Windows are computed over characters rather than bytes, so
//! multi-byte UTF-8 content never splits inside a code point.
//!
//! # Usage
//!
//! ```
//! use coderag_context::text::TextSplitter;
//!
//! let splitter = TextSplitter::new(500, 50);
//! let chunks = splitter.chunk_page("paper.pdf", 1, "some page text");
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].source, "paper.pdf");
//! assert_eq!(chunks[0].page, 1);
//! assert_eq!(chunks[0].text, "some page text");
//! ```

use serde::Serialize;

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default number of characters shared between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// A bounded-length slice of document text used as a retrieval unit.
///
/// Chunks reference their origin for provenance only; the page text they
/// were cut from is not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Display name of the source document (usually the PDF path)
    pub source: String,
    /// 1-based page number within the source document
    pub page: u32,
    /// 0-based position of this chunk within its page
    pub sequence: usize,
    /// The chunk text itself
    pub text: String,
}

/// Splits text into fixed-size overlapping character windows.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl TextSplitter {
    /// Create a splitter producing chunks of at most `chunk_size` characters
    /// where consecutive chunks share `overlap` characters.
    ///
    /// `overlap` must be strictly smaller than `chunk_size`, otherwise the
    /// window could never advance; violations are clamped.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let overlap = overlap.min(chunk_size - 1);
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared between consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into overlapping windows.
    ///
    /// Whitespace-only input produces no chunks; any other non-empty input
    /// produces at least one. The final window always ends at the end of the
    /// text, so concatenating the windows with the overlaps removed
    /// reconstructs the original text.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of each character, so windows land on char boundaries.
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_len = offsets.len();
        let byte_at = |char_idx: usize| offsets.get(char_idx).copied().unwrap_or(text.len());

        let step = self.chunk_size - self.overlap;
        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_len);
            windows.push(text[byte_at(start)..byte_at(end)].to_string());
            if end == char_len {
                break;
            }
            start += step;
        }
        windows
    }

    /// Split one page of a document into provenance-carrying chunks.
    pub fn chunk_page(&self, source: &str, page: u32, text: &str) -> Vec<TextChunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(sequence, text)| TextChunk {
                source: source.to_string(),
                page,
                sequence,
                text,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split("hello world");
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn blank_text_produces_no_chunks() {
        let splitter = TextSplitter::default();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\t  ").is_empty());
    }

    #[test]
    fn window_count_follows_the_overlap_law() {
        // With chunk_size=500 and overlap=50 the window advances 450 chars
        // at a time, so 1000 chars need 3 windows: [0,500), [450,950),
        // [900,1000).
        let splitter = TextSplitter::new(500, 50);
        let text = "a".repeat(1000);
        let chunks = splitter.split(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 100);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap() {
        let splitter = TextSplitter::new(10, 4);
        let text: String = ('a'..='z').collect();
        let chunks = splitter.split(&text);

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(pair[0].chars().count() - 4).collect();
            let head: String = pair[1].chars().take(4).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn exact_multiple_does_not_emit_an_empty_tail() {
        let splitter = TextSplitter::new(500, 50);
        let text = "b".repeat(500);
        let chunks = splitter.split(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 500);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let splitter = TextSplitter::new(10, 2);
        let text = "héllo wörld ünïcode tèxt with áccents".to_string();
        let chunks = splitter.split(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn chunk_page_records_provenance() {
        let splitter = TextSplitter::new(500, 50);
        let chunks = splitter.chunk_page("docs/paper.pdf", 3, &"x".repeat(600));

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.source == "docs/paper.pdf"));
        assert!(chunks.iter().all(|c| c.page == 3));
        assert_eq!(chunks[0].sequence, 0);
        assert_eq!(chunks[1].sequence, 1);
    }

    #[test]
    fn overlap_is_clamped_below_chunk_size() {
        let splitter = TextSplitter::new(10, 10);
        assert_eq!(splitter.overlap(), 9);
        // Must still terminate.
        let chunks = splitter.split(&"y".repeat(40));
        assert!(!chunks.is_empty());
    }
}
