//! Image preprocessing for OCR input.

pub mod enhance;

pub use enhance::{PixelEnhancer, enhance_image};
