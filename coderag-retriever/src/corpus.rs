//! PDF corpus discovery and per-page text extraction.
//!
//! The corpus is a flat folder of PDF files (no recursion). Discovery never
//! fails on an absent folder: the folder is created and an empty set is
//! returned, signalling "corpus not yet populated" rather than an error.
//! A data-driven fallback list of bundled paper filenames covers the case
//! where no corpus folder has been set up at all.

use anyhow::{Context, Result};
use lopdf::Document;
use std::fs;
use std::path::{Path, PathBuf};

/// Fallback corpus: bundled paper filenames used when no default-PDFs
/// directory is present. Entries missing from disk are skipped with a
/// warning.
pub const FALLBACK_PDF_FILES: &[&str] = &[
    "layout-parser-paper.pdf",
    "Python_vulnarabilities_1.pdf",
    "Python_vulnarabilities_2.pdf",
    "Python_vulnarabilities_detection.pdf",
    "Secure_vulnarabilities.pdf",
];

/// Page-level text extracted from one PDF.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Path of the PDF this page came from
    pub source: PathBuf,
    /// 1-based page number
    pub page: u32,
    /// Extracted page text
    pub text: String,
}

/// List the PDF files directly inside `folder`, sorted by path.
///
/// If the folder does not exist it is created and an empty list is returned,
/// so the caller can tell the user to populate it. Calling twice is
/// idempotent. The extension match is case-insensitive.
pub fn pdf_files_in_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        tracing::warn!(
            "Corpus folder {} does not exist, creating it",
            folder.display()
        );
        fs::create_dir_all(folder)
            .with_context(|| format!("creating corpus folder {}", folder.display()))?;
        return Ok(Vec::new());
    }

    let mut pdf_files = Vec::new();
    for entry in fs::read_dir(folder)
        .with_context(|| format!("reading corpus folder {}", folder.display()))?
    {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            pdf_files.push(path);
        }
    }
    pdf_files.sort();
    Ok(pdf_files)
}

/// Resolve the default corpus: the contents of `default_dir` when it exists
/// and holds PDFs, otherwise the members of [`FALLBACK_PDF_FILES`] that
/// exist on disk (missing entries are skipped with a warning).
pub fn default_pdf_files(default_dir: &Path) -> Vec<PathBuf> {
    if default_dir.is_dir() {
        if let Ok(files) = pdf_files_in_folder(default_dir) {
            if !files.is_empty() {
                return files;
            }
        }
    }

    FALLBACK_PDF_FILES
        .iter()
        .map(PathBuf::from)
        .filter(|path| {
            let present = path.exists();
            if !present {
                tracing::warn!("File {} not found, skipping", path.display());
            }
            present
        })
        .collect()
}

/// Extract per-page text from one PDF.
///
/// Pages whose extracted text is blank are dropped; pages that fail to
/// extract are skipped with a warning rather than failing the document.
pub fn load_pdf_pages(path: &Path) -> Result<Vec<PdfPage>> {
    let doc =
        Document::load(path).with_context(|| format!("loading PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for (page_number, _) in doc.get_pages() {
        match doc.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(PdfPage {
                source: path.to_path_buf(),
                page: page_number,
                text,
            }),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "Failed to extract page {} of {}: {e}",
                    page_number,
                    path.display()
                );
            }
        }
    }
    Ok(pages)
}

/// Load every listed PDF, skipping files that are missing or unreadable.
///
/// Returns all extracted pages plus the paths that actually loaded. An
/// entirely empty result is not an error here; the index builder decides
/// whether that is fatal.
pub fn load_corpus(pdf_files: &[PathBuf]) -> (Vec<PdfPage>, Vec<PathBuf>) {
    let mut all_pages = Vec::new();
    let mut loaded_files = Vec::new();

    for path in pdf_files {
        if !path.exists() {
            tracing::warn!("File {} not found, skipping", path.display());
            continue;
        }
        tracing::info!("Loading documents from {}", path.display());
        match load_pdf_pages(path) {
            Ok(pages) => {
                all_pages.extend(pages);
                loaded_files.push(path.clone());
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {e}", path.display());
            }
        }
    }

    (all_pages, loaded_files)
}
