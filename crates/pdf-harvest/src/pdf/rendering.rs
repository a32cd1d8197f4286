//! Page rasterization with pdfium.
//!
//! Only compiled with the `pdfium` feature. The library is bound from the
//! system search path on first use.

use super::bindings::bind_pdfium;
use super::error::{PdfError, Result};
use crate::plugins::{PageRasterizer, Plugin};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Largest edge, in pixels, of a rendered page.
const MAX_IMAGE_DIMENSION: f32 = 16384.0;

/// Render zero-based `page_indices` of `pdf_bytes` to PNG buffers.
pub fn render_pages_to_png(pdf_bytes: &[u8], page_indices: &[u32], scale: f32) -> Result<Vec<Vec<u8>>> {
    let pdfium = Pdfium::new(bind_pdfium(PdfError::RenderingFailed, "page rendering")?);
    let document = pdfium.load_pdf_from_byte_slice(pdf_bytes, None).map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.to_lowercase().contains("password") {
            PdfError::Encrypted
        } else {
            PdfError::InvalidPdf(err_msg)
        }
    })?;

    let mut images = Vec::with_capacity(page_indices.len());
    for &index in page_indices {
        let page = document
            .pages()
            .get(index as u16)
            .map_err(|_| PdfError::PageNotFound(index + 1))?;

        let width = page.width().value;
        let height = page.height().value;
        let scale = effective_scale(width, height, scale);

        let config = PdfRenderConfig::new()
            .set_target_width(((width * scale) as i32).max(1))
            .set_target_height(((height * scale) as i32).max(1))
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page {}: {}", index + 1, e)))?;

        let image = DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8());
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PdfError::RenderingFailed(format!("Failed to encode page {}: {}", index + 1, e)))?;
        images.push(png);
    }

    Ok(images)
}

/// Clamp `scale` so neither edge of the rendered page exceeds the pixel limit.
fn effective_scale(width_points: f32, height_points: f32, scale: f32) -> f32 {
    let longest = width_points.max(height_points);
    if longest <= 0.0 || longest * scale <= MAX_IMAGE_DIMENSION {
        return scale;
    }
    MAX_IMAGE_DIMENSION / longest
}

/// Rasterizer backed by the pdfium library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for PdfiumRasterizer {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> crate::Result<()> {
        bind_pdfium(PdfError::RenderingFailed, "rasterizer initialization")
            .map(|_| ())
            .map_err(|e| crate::HarvestError::MissingDependency(e.to_string()))
    }

    fn shutdown(&self) -> crate::Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Renders PDF pages to PNG with pdfium"
    }
}

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn rasterize(&self, pdf_path: &Path, page_indices: &[u32], scale: f32) -> crate::Result<Vec<Vec<u8>>> {
        let bytes = tokio::fs::read(pdf_path).await?;
        let indices = page_indices.to_vec();

        tokio::task::spawn_blocking(move || render_pages_to_png(&bytes, &indices, scale))
            .await
            .map_err(|e| crate::HarvestError::image_extraction_failed(format!("Rendering task failed: {}", e)))?
            .map_err(Into::into)
    }
}
