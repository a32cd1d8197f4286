//! Text extraction engine trait.

use crate::Result;
use crate::plugins::Plugin;
use crate::types::DocumentMetadata;
use async_trait::async_trait;

/// Output of one text extraction call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextExtraction {
    /// Text of the requested pages, in page order.
    pub text: String,
    /// Document metadata; `number_of_pages` counts the whole document, not the pages requested.
    pub metadata: DocumentMetadata,
}

impl TextExtraction {
    pub fn page_count(&self) -> u32 {
        self.metadata.number_of_pages
    }
}

/// Adapter over a PDF parsing engine.
#[async_trait]
pub trait TextExtractionEngine: Plugin {
    /// Extract the text of `pages` (1-based), or of every page when `None`.
    ///
    /// A page that cannot be parsed fails the whole call; the caller decides
    /// whether to skip the chunk.
    async fn extract(&self, pdf: &[u8], pages: Option<&[u32]>) -> Result<TextExtraction>;

    /// Cheap first pass returning page count and metadata, touching at most one page.
    async fn probe(&self, pdf: &[u8]) -> Result<TextExtraction> {
        self.extract(pdf, Some(&[1])).await
    }
}
