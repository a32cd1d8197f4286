//! Page rasterization through poppler's `pdftoppm`.

use crate::plugins::{PageRasterizer, Plugin};
use crate::utils::{CommandError, run_command};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;

const PDFTOPPM: &str = "pdftoppm";

pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 120;

/// `(scale, dpi)` pairs of the OCR quality tiers: fast, balanced, accurate.
const QUALITY_DPI: [(f32, f32); 3] = [(1.0, 150.0), (1.5, 200.0), (2.0, 300.0)];

/// DPI per unit of scale outside the quality tiers.
const DPI_PER_SCALE: f32 = 150.0;

/// Convert a render scale into the DPI passed to `pdftoppm`.
///
/// The quality tier scales land on their documented resolutions (1.0 → 150,
/// 1.5 → 200, 2.0 → 300). Scales between tiers interpolate linearly; scales
/// outside them are proportional at 150 DPI per unit.
pub fn scale_to_dpi(scale: f32) -> u32 {
    let dpi = match QUALITY_DPI.windows(2).find(|w| scale >= w[0].0 && scale <= w[1].0) {
        Some(w) => {
            let (low, high) = (w[0], w[1]);
            low.1 + (scale - low.0) / (high.0 - low.0) * (high.1 - low.1)
        }
        None => scale * DPI_PER_SCALE,
    };
    dpi.round().max(1.0) as u32
}

fn render_error(error: CommandError, page_index: u32) -> HarvestError {
    let message = match error {
        CommandError::NotFound { .. } => "pdftoppm (poppler-utils) is required to render PDF pages".to_string(),
        _ => format!("Failed to render page {}", page_index + 1),
    };
    HarvestError::image_extraction_failed_with_source(message, error)
}

/// Rasterizer invoking `pdftoppm` once per page.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    timeout_secs: u64,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
        }
    }
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    async fn render_page(&self, pdf_path: &Path, page_index: u32, dpi: u32, out_dir: &Path) -> Result<Vec<u8>> {
        let page = (page_index + 1).to_string();
        let prefix = out_dir.join(format!("page-{}", page));
        let dpi = dpi.to_string();

        let args: [&OsStr; 10] = [
            OsStr::new("-png"),
            OsStr::new("-r"),
            OsStr::new(&dpi),
            OsStr::new("-f"),
            OsStr::new(&page),
            OsStr::new("-l"),
            OsStr::new(&page),
            OsStr::new("-singlefile"),
            pdf_path.as_os_str(),
            prefix.as_os_str(),
        ];

        run_command(PDFTOPPM, args, None, self.timeout_secs)
            .await
            .map_err(|e| render_error(e, page_index))?;

        let png_path = prefix.with_extension("png");
        tokio::fs::read(&png_path).await.map_err(|e| {
            HarvestError::image_extraction_failed_with_source(
                format!("Rendered image for page {} is missing", page_index + 1),
                e,
            )
        })
    }
}

impl Plugin for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Renders PDF pages to PNG with poppler's pdftoppm"
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf_path: &Path, page_indices: &[u32], scale: f32) -> Result<Vec<Vec<u8>>> {
        let out_dir = tempfile::Builder::new()
            .prefix(crate::core::io::TEMP_FILE_PREFIX)
            .tempdir()
            .map_err(|e| HarvestError::image_extraction_failed_with_source("Could not create render directory", e))?;
        let dpi = scale_to_dpi(scale);

        let mut images = Vec::with_capacity(page_indices.len());
        for &index in page_indices {
            tracing::debug!(page = index + 1, dpi, "Rendering page with pdftoppm");
            images.push(self.render_page(pdf_path, index, dpi, out_dir.path()).await?);
        }

        Ok(images)
    }
}
