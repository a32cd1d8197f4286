//! Pixel-level enhancement of rendered pages.
//!
//! Pages are converted to 8-bit grayscale, then contrast, brightness and
//! sharpness are scaled by their factors (1.0 is the identity) and an optional
//! 3x3 median filter removes speckle noise.

use crate::plugins::{EnhancementOptions, ImageEnhancer, Plugin};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::path::{Path, PathBuf};

/// Gaussian sigma of the blur that sharpening extrapolates away from.
const SHARPEN_SIGMA: f32 = 1.0;

const MEDIAN_RADIUS: u32 = 1;

fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn adjust_contrast(image: &mut GrayImage, factor: f32) {
    let pixels = u64::from(image.width()) * u64::from(image.height());
    if pixels == 0 {
        return;
    }
    let sum: u64 = image.pixels().map(|p| u64::from(p.0[0])).sum();
    let mean = sum as f32 / pixels as f32;

    for pixel in image.pixels_mut() {
        let value = f32::from(pixel.0[0]);
        pixel.0[0] = clamp_u8(mean + (value - mean) * factor);
    }
}

fn adjust_brightness(image: &mut GrayImage, factor: f32) {
    for pixel in image.pixels_mut() {
        pixel.0[0] = clamp_u8(f32::from(pixel.0[0]) * factor);
    }
}

fn adjust_sharpness(image: &GrayImage, factor: f32) -> GrayImage {
    let blurred = imageproc::filter::gaussian_blur_f32(image, SHARPEN_SIGMA);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let original = f32::from(image.get_pixel(x, y).0[0]);
        let smooth = f32::from(blurred.get_pixel(x, y).0[0]);
        Luma([clamp_u8(smooth + (original - smooth) * factor)])
    })
}

/// Apply `options` to a decoded image.
pub fn enhance_image(image: &DynamicImage, options: &EnhancementOptions) -> GrayImage {
    let mut gray = image.to_luma8();

    if (options.contrast - 1.0).abs() > f32::EPSILON {
        adjust_contrast(&mut gray, options.contrast);
    }
    if (options.brightness - 1.0).abs() > f32::EPSILON {
        adjust_brightness(&mut gray, options.brightness);
    }
    if (options.sharpness - 1.0).abs() > f32::EPSILON && gray.width() > 0 && gray.height() > 0 {
        gray = adjust_sharpness(&gray, options.sharpness);
    }
    if options.denoise {
        gray = imageproc::filter::median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
    }

    gray
}

/// Path of the enhanced copy: `{stem}_enhanced.png` next to the original.
pub fn enhanced_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image_path.with_file_name(format!("{}_enhanced.png", stem))
}

fn enhance_file(image_path: &Path, options: &EnhancementOptions) -> Result<PathBuf> {
    let image = image::open(image_path).map_err(|e| {
        HarvestError::enhancement_failed_with_source(format!("Failed to open {}", image_path.display()), e)
    })?;

    let output = enhanced_path(image_path);
    enhance_image(&image, options)
        .save_with_format(&output, ImageFormat::Png)
        .map_err(|e| {
            HarvestError::enhancement_failed_with_source(format!("Failed to write {}", output.display()), e)
        })?;

    Ok(output)
}

/// Enhancer built on the `image` and `imageproc` crates.
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelEnhancer;

impl PixelEnhancer {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for PixelEnhancer {
    fn name(&self) -> &str {
        "pixel-enhancer"
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
        "Grayscale, contrast, brightness, sharpening and median denoising"
    }
}

#[async_trait]
impl ImageEnhancer for PixelEnhancer {
    async fn try_enhance(&self, image_path: &Path, options: &EnhancementOptions) -> Result<PathBuf> {
        let path = image_path.to_path_buf();
        let options = *options;

        tokio::task::spawn_blocking(move || enhance_file(&path, &options))
            .await
            .map_err(|e| HarvestError::enhancement_failed(format!("Enhancement task failed: {}", e)))?
    }
}
