//! Table detector trait.

use crate::Result;
use crate::plugins::Plugin;
use crate::tables::RawTableResult;
use async_trait::async_trait;
use std::path::Path;

/// Adapter over a PDF table-detection engine.
#[async_trait]
pub trait TableDetector: Plugin {
    /// Detect raw cell grids on the given 1-based pages, or every page when `None`.
    ///
    /// Failures are reported as `HarvestError::TableExtractionFailed`.
    async fn detect_tables(&self, pdf_path: &Path, pages: Option<&[u32]>) -> Result<RawTableResult>;
}
