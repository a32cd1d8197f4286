//! Image enhancer trait.

use crate::Result;
use crate::plugins::Plugin;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Enhancement parameters. Factors of 1.0 leave the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancementOptions {
    pub contrast: f32,
    pub brightness: f32,
    pub sharpness: f32,
    pub denoise: bool,
}

impl Default for EnhancementOptions {
    fn default() -> Self {
        Self {
            contrast: 1.2,
            brightness: 1.1,
            sharpness: 1.5,
            denoise: true,
        }
    }
}

/// Adapter over an image-processing engine used to prepare OCR input.
#[async_trait]
pub trait ImageEnhancer: Plugin {
    /// Write an enhanced copy of `image_path` and return its path.
    async fn try_enhance(&self, image_path: &Path, options: &EnhancementOptions) -> Result<PathBuf>;

    /// Best-effort enhancement: any failure yields `image_path` unchanged.
    async fn enhance(&self, image_path: &Path, options: &EnhancementOptions) -> PathBuf {
        match self.try_enhance(image_path, options).await {
            Ok(enhanced) => enhanced,
            Err(e) => {
                tracing::warn!(
                    image = %image_path.display(),
                    error = %e,
                    "Image enhancement failed, using original image"
                );
                image_path.to_path_buf()
            }
        }
    }
}
