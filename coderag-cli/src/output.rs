//! Plain-text report writer.
//!
//! The report format is an external interface: a mode header, the full
//! answer verbatim, and a bounded preview of each context document. The
//! output file is overwritten unconditionally.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::analyze::Analysis;

/// How many characters of each context document appear in the report.
pub const DOC_PREVIEW_CHARS: usize = 500;

/// Which analysis path ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Rag,
    Direct,
}

/// Which corpus fed retrieval, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusSource {
    Default,
    Custom,
    None,
}

impl CorpusSource {
    pub fn label(&self) -> &'static str {
        match self {
            CorpusSource::Default => "default",
            CorpusSource::Custom => "custom",
            CorpusSource::None => "none",
        }
    }
}

/// Write the analysis report, overwriting anything at `path`.
pub fn write_report(
    path: &Path,
    analysis: &Analysis,
    mode: AnalysisMode,
    source: CorpusSource,
) -> Result<()> {
    let mut out = String::new();

    match mode {
        AnalysisMode::Rag => {
            out.push_str(&format!("Answer (with RAG - source: {}):\n", source.label()));
        }
        AnalysisMode::Direct => out.push_str("Answer (without RAG):\n"),
    }

    out.push_str(&analysis.answer);

    if !analysis.context_docs.is_empty() {
        out.push_str("\n\nUsed documents:\n");
        for (i, doc) in analysis.context_docs.iter().enumerate() {
            let preview: String = doc.chars().take(DOC_PREVIEW_CHARS).collect();
            out.push_str(&format!("\n--- Document {} ---\n{preview}...\n", i + 1));
        }
    } else if mode == AnalysisMode::Rag {
        out.push_str("\n\nNo documents were used for RAG analysis.\n");
    }

    fs::write(path, out).with_context(|| format!("writing report to {}", path.display()))
}
