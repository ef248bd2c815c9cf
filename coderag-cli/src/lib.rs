//! # coderag-cli
//!
//! Retrieval-augmented code review from the command line: read a source
//! file, optionally pull the most similar chunks from an embedded PDF
//! corpus, ask a hosted LLM for an analysis, and write a plain-text report.
//!
//! The binary is thin orchestration; the interesting pieces live in
//! [`coderag_retriever`] (corpus + index + retrieval) and [`coderag_embed`]
//! (local embedding model). This crate adds configuration, the Mistral
//! client, the two analyzers, and the report writer.

pub mod analyze;
pub mod config;
pub mod llm;
pub mod output;

use anyhow::Result;
use coderag_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
use coderag_retriever::{
    EmbeddingModelMetadata, IndexBuilder, Retriever, default_pdf_files, load_corpus,
    pdf_files_in_folder,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use analyze::{Analysis, analyze_direct, analyze_with_rag};
pub use config::Config;
pub use llm::{ChatModel, MistralClient};
pub use output::{AnalysisMode, CorpusSource, write_report};

/// Run one analysis end to end and write the report.
///
/// `mode` and `use_custom_pdf` are resolved once from the CLI flags; all
/// branching on them happens here, not downstream.
pub async fn run(
    config: &Config,
    input_file: &Path,
    mode: AnalysisMode,
    use_custom_pdf: bool,
) -> Result<()> {
    let llm = MistralClient::new(config.api_key.clone());

    let (analysis, source) = match mode {
        AnalysisMode::Direct => {
            println!("Analyzing code without RAG");
            let analysis = analyze_direct(input_file, &llm).await?;
            (analysis, CorpusSource::None)
        }
        AnalysisMode::Rag => {
            let (pdf_files, source) = select_corpus(config, use_custom_pdf)?;
            let cache_suffix = cache_suffix(use_custom_pdf);

            let (pages, loaded) = load_corpus(&pdf_files);
            println!("Loaded {} PDF files", loaded.len());

            let retriever = build_retriever(config, &pages, cache_suffix).await?;
            let analysis = analyze_with_rag(input_file, &retriever, &llm).await?;
            (analysis, source)
        }
    };

    write_report(&config.output_path, &analysis, mode, source)?;
    println!(
        "Analysis completed. Result saved to {}",
        config.output_path.display()
    );
    Ok(())
}

/// Cache directory suffix for a corpus toggle.
///
/// Follows the flag, not the resolved source: a custom run that fell back
/// to the default list still keeps its own cache.
fn cache_suffix(use_custom_pdf: bool) -> &'static str {
    if use_custom_pdf { "_custom" } else { "" }
}

/// Pick the PDF set and its source label from the corpus toggle.
fn select_corpus(config: &Config, use_custom_pdf: bool) -> Result<(Vec<PathBuf>, CorpusSource)> {
    if use_custom_pdf {
        println!(
            "Loading PDFs from '{}' folder...",
            config.pdf_folder.display()
        );
        let files = pdf_files_in_folder(&config.pdf_folder)?;
        if files.is_empty() {
            println!(
                "No PDF files found in '{}'. Falling back to default PDFs.",
                config.pdf_folder.display()
            );
            Ok((
                default_pdf_files(&config.default_pdfs_dir),
                CorpusSource::Default,
            ))
        } else {
            println!("Found {} custom PDF files", files.len());
            Ok((files, CorpusSource::Custom))
        }
    } else {
        Ok((
            default_pdf_files(&config.default_pdfs_dir),
            CorpusSource::Default,
        ))
    }
}

/// Load the embedding model and build or load the chunk index.
async fn build_retriever(
    config: &Config,
    pages: &[coderag_retriever::PdfPage],
    cache_suffix: &str,
) -> Result<Retriever> {
    let embed_config = EmbedConfig::default();
    let model_name = embed_config.model_name.clone();
    let normalized = embed_config.normalize;

    let provider = Arc::new(FastEmbedProvider::create(embed_config).await?);
    let model = EmbeddingModelMetadata::new(
        model_name,
        provider.provider_name(),
        provider.embedding_dimension(),
    )
    .with_normalized(normalized);

    let builder = IndexBuilder::new(config.cache_path.clone(), provider, model);
    builder.build_or_load(pages, cache_suffix).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(root: &std::path::Path) -> Config {
        Config {
            api_key: "sk-test".to_string(),
            cache_path: root.join("cache").to_string_lossy().into_owned(),
            pdf_folder: root.join("pdf_documents"),
            default_pdfs_dir: root.join("default_pdfs"),
            output_path: root.join("output.txt"),
        }
    }

    #[test]
    fn empty_custom_folder_falls_back_to_the_default_corpus() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.default_pdfs_dir).unwrap();
        std::fs::write(config.default_pdfs_dir.join("bundled.pdf"), b"x").unwrap();

        let (files, source) = select_corpus(&config, true).unwrap();

        assert_eq!(source, CorpusSource::Default);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("bundled.pdf"));
        // The empty custom folder was created so the user can populate it.
        assert!(config.pdf_folder.is_dir());
        // The fallback does not change which cache the run uses.
        assert_eq!(cache_suffix(true), "_custom");
    }

    #[test]
    fn populated_custom_folder_is_used_as_is() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.pdf_folder).unwrap();
        std::fs::write(config.pdf_folder.join("mine.pdf"), b"x").unwrap();

        let (files, source) = select_corpus(&config, true).unwrap();

        assert_eq!(source, CorpusSource::Custom);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("mine.pdf"));
    }

    #[test]
    fn default_toggle_never_reads_the_custom_folder() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.default_pdfs_dir).unwrap();
        std::fs::write(config.default_pdfs_dir.join("bundled.pdf"), b"x").unwrap();
        std::fs::create_dir_all(&config.pdf_folder).unwrap();
        std::fs::write(config.pdf_folder.join("mine.pdf"), b"x").unwrap();

        let (files, source) = select_corpus(&config, false).unwrap();

        assert_eq!(source, CorpusSource::Default);
        assert!(files.iter().all(|p| p.ends_with("bundled.pdf")));
        assert_eq!(cache_suffix(false), "");
    }
}
