//! PDF text extraction with lopdf.
//!
//! [`LopdfTextEngine`] is the default [`TextExtractionEngine`]. Parsing is
//! CPU-bound, so every call runs on the blocking thread pool.

use super::error::{PdfError, Result};
use super::metadata::extract_metadata_from_document;
use crate::plugins::{Plugin, TextExtraction, TextExtractionEngine};
use async_trait::async_trait;
use lopdf::Document;

/// Separator inserted between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Load a document, rejecting encrypted files.
pub fn load_document(pdf_bytes: &[u8]) -> Result<Document> {
    let document = Document::load_mem(pdf_bytes)?;
    if document.trailer.get(b"Encrypt").is_ok() {
        return Err(PdfError::Encrypted);
    }
    Ok(document)
}

/// Extract text and metadata for `pages` (1-based), or every page when `None`.
///
/// Pages beyond the document are an error; a page whose content cannot be
/// decoded fails the whole call.
pub fn extract_text_from_pdf(pdf_bytes: &[u8], pages: Option<&[u32]>) -> Result<TextExtraction> {
    let document = load_document(pdf_bytes)?;
    let metadata = extract_metadata_from_document(&document)?;
    let available = document.get_pages();

    let selected: Vec<u32> = match pages {
        Some(pages) => pages.to_vec(),
        None => available.keys().copied().collect(),
    };

    let mut text = String::new();
    for (idx, page) in selected.iter().enumerate() {
        if !available.contains_key(page) {
            return Err(PdfError::PageNotFound(*page));
        }

        let page_text = document
            .extract_text(&[*page])
            .map_err(|e| PdfError::TextExtractionFailed(format!("Page {}: {}", page, e)))?;

        if idx > 0 {
            text.push_str(PAGE_SEPARATOR);
        }
        text.push_str(page_text.trim_end());
    }

    Ok(TextExtraction { text, metadata })
}

/// Text extraction engine backed by lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfTextEngine;

impl LopdfTextEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for LopdfTextEngine {
    fn name(&self) -> &str {
        "lopdf-text"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> crate::Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> crate::Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Extracts text and document metadata with lopdf"
    }
}

#[async_trait]
impl TextExtractionEngine for LopdfTextEngine {
    async fn extract(&self, pdf: &[u8], pages: Option<&[u32]>) -> crate::Result<TextExtraction> {
        let pdf_owned = pdf.to_vec();
        let pages_owned = pages.map(<[u32]>::to_vec);

        tokio::task::spawn_blocking(move || extract_text_from_pdf(&pdf_owned, pages_owned.as_deref()))
            .await
            .map_err(|e| crate::HarvestError::text_extraction_failed(format!("Text extraction task failed: {}", e)))?
            .map_err(Into::into)
    }

    async fn probe(&self, pdf: &[u8]) -> crate::Result<TextExtraction> {
        let pdf_owned = pdf.to_vec();

        tokio::task::spawn_blocking(move || -> Result<TextExtraction> {
            let document = load_document(&pdf_owned)?;
            let metadata = extract_metadata_from_document(&document)?;
            let text = match document.get_pages().keys().next() {
                Some(first) => document
                    .extract_text(&[*first])
                    .map(|t| t.trim_end().to_string())
                    .unwrap_or_default(),
                None => String::new(),
            };
            Ok(TextExtraction { text, metadata })
        })
        .await
        .map_err(|e| crate::HarvestError::text_extraction_failed(format!("Text extraction task failed: {}", e)))?
        .map_err(Into::into)
    }
}
