//! Page rasterizer trait.

use crate::Result;
use crate::plugins::Plugin;
use async_trait::async_trait;
use std::path::Path;

/// Adapter over a PDF-to-raster conversion engine.
#[async_trait]
pub trait PageRasterizer: Plugin {
    /// Render the given zero-based page indices to PNG buffers.
    ///
    /// The output is aligned positionally with `page_indices`. `scale` is relative
    /// to 72 DPI. Failures are reported as `HarvestError::ImageExtractionFailed`.
    async fn rasterize(&self, pdf_path: &Path, page_indices: &[u32], scale: f32) -> Result<Vec<Vec<u8>>>;
}
