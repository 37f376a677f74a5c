//! Text extraction from PDF files.
//!
//! A document is the full text of one PDF, labelled with its file name so
//! answers can cite where their context came from.

mod pdf;

pub use pdf::PdfExtractor;

use crate::error::{FolioError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Text extracted from a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// File name, used as the citation label.
    pub source: String,
    /// Full path the text was read from.
    pub path: PathBuf,
    /// Extracted text of every page, in page order.
    pub content: String,
}

/// A file that was found but not loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub source: String,
    pub reason: String,
}

/// Outcome of scanning a directory.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Documents with text, sorted by source.
    pub documents: Vec<ExtractedDocument>,
    /// Files that yielded no text or failed to parse.
    pub skipped: Vec<SkippedFile>,
}

/// Trait for turning a file into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract all text from the file at `path`.
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// Check whether a path has a `.pdf` extension (any case).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// File name of `path`, falling back to the full path.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract a single file. Whitespace-only text is reported as an error.
#[instrument(skip(extractor, path), fields(path = %path.display()))]
pub async fn extract_file(extractor: &dyn TextExtractor, path: &Path) -> Result<ExtractedDocument> {
    if !path.is_file() {
        return Err(FolioError::InvalidInput(format!(
            "Not a file: {}",
            path.display()
        )));
    }

    let content = extractor.extract(path).await?;
    if content.trim().is_empty() {
        return Err(FolioError::Extraction(format!(
            "{} contains no extractable text",
            source_name(path)
        )));
    }

    Ok(ExtractedDocument {
        source: source_name(path),
        path: path.to_path_buf(),
        content,
    })
}

/// Extract every PDF directly inside `dir`.
///
/// Unreadable or empty files are recorded in [`ExtractionReport::skipped`]
/// instead of failing the whole scan.
#[instrument(skip(extractor, dir), fields(dir = %dir.display()))]
pub async fn extract_directory(
    extractor: &dyn TextExtractor,
    dir: &Path,
    max_concurrent: usize,
) -> Result<ExtractionReport> {
    if !dir.is_dir() {
        return Err(FolioError::InvalidInput(format!(
            "PDF directory does not exist: {}",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_pdf(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    debug!("Found {} PDF files", paths.len());

    let results: Vec<(PathBuf, Result<String>)> = stream::iter(paths)
        .map(|path| async move {
            let result = extractor.extract(&path).await;
            (path, result)
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut report = ExtractionReport::default();

    for (path, result) in results {
        let source = source_name(&path);
        match result {
            Ok(content) if content.trim().is_empty() => {
                info!("Skipped (no text): {}", source);
                report.skipped.push(SkippedFile {
                    source,
                    reason: "no text".to_string(),
                });
            }
            Ok(content) => {
                info!("Loaded: {}", source);
                report.documents.push(ExtractedDocument {
                    source,
                    path,
                    content,
                });
            }
            Err(e) => {
                warn!("Skipped (unreadable): {}: {}", source, e);
                report.skipped.push(SkippedFile {
                    source,
                    reason: e.to_string(),
                });
            }
        }
    }

    report.documents.sort_by(|a, b| a.source.cmp(&b.source));
    report.skipped.sort_by(|a, b| a.source.cmp(&b.source));

    Ok(report)
}
