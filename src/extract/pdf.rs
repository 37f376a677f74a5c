//! PDF text extraction backed by `pdf-extract`.

use super::TextExtractor;
use crate::error::{FolioError, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Extracts the text layer of PDF files.
///
/// Scanned PDFs without a text layer come back empty; no OCR is attempted.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    #[instrument(skip(self, path), fields(path = %path.display()))]
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let name = path.display().to_string();

        // Parsing is CPU-bound and the library may panic on malformed files.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| FolioError::Extraction(format!("{}: parser crashed: {}", name, e)))?
            .map_err(|e| FolioError::Extraction(format!("{}: {}", name, e)))?;

        debug!("Extracted {} characters", text.chars().count());
        Ok(text)
    }
}
