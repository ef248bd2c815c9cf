//! Runtime configuration, read once from the environment at startup.
//!
//! The resulting [`Config`] is passed explicitly through the call chain;
//! nothing else in the program reads the environment. Construction takes an
//! injectable lookup so tests never mutate process-wide env state.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Default base name of the on-disk chunk index cache directory.
pub const DEFAULT_CACHE_PATH: &str = "faiss_pdf_index";

/// Default folder scanned for a user-supplied PDF corpus.
pub const DEFAULT_PDF_FOLDER: &str = "pdf_documents";

/// Directory holding the PDFs bundled with a deployment.
pub const DEFAULT_PDFS_DIR: &str = "default_pdfs";

/// Where the analysis report is written.
pub const OUTPUT_PATH: &str = "output.txt";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mistral API key (required)
    pub api_key: String,
    /// Base cache path; the corpus suffix is appended to this name
    pub cache_path: String,
    /// Folder scanned when `--custom-pdf` is given
    pub pdf_folder: PathBuf,
    /// Bundled default-PDFs directory
    pub default_pdfs_dir: PathBuf,
    /// Report output file
    pub output_path: PathBuf,
}

impl Config {
    /// Build the configuration from process environment variables.
    ///
    /// Fails fast if `MISTRAL_API_KEY` is absent, before any network or
    /// index work happens.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("MISTRAL_API_KEY")
            .filter(|key| !key.is_empty())
            .context("MISTRAL_API_KEY not found in environment variables")?;

        Ok(Self {
            api_key,
            cache_path: lookup("CACHE_PATH").unwrap_or_else(|| DEFAULT_CACHE_PATH.to_string()),
            pdf_folder: lookup("DEFAULT_PDF_FOLDER")
                .unwrap_or_else(|| DEFAULT_PDF_FOLDER.to_string())
                .into(),
            default_pdfs_dir: PathBuf::from(DEFAULT_PDFS_DIR),
            output_path: PathBuf::from(OUTPUT_PATH),
        })
    }
}

/// Help-text trailer showing the effective cache and corpus settings.
pub fn settings_help() -> String {
    format!(
        "Current configuration:\n  CACHE_PATH: {}\n  DEFAULT_PDF_FOLDER: {}",
        std::env::var("CACHE_PATH").unwrap_or_else(|_| DEFAULT_CACHE_PATH.to_string()),
        std::env::var("DEFAULT_PDF_FOLDER").unwrap_or_else(|_| DEFAULT_PDF_FOLDER.to_string()),
    )
}
