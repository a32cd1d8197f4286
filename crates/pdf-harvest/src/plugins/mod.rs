//! Engine adapter traits.
//!
//! Every third-party capability the pipeline depends on is modelled as a trait
//! extending [`Plugin`]. The pipeline holds each adapter as `Arc<dyn Trait>`;
//! production implementations live next to the engine they wrap and tests swap
//! in deterministic stubs.
//!
//! - [`TextExtractionEngine`] - PDF text and metadata
//! - [`PageRasterizer`] - page images
//! - [`ImageEnhancer`] - OCR input preprocessing
//! - [`OcrBackend`] - text recognition
//! - [`TableDetector`] - raw table grids
//! - [`SpellChecker`] - OCR post-correction

mod enhancer;
mod ocr;
mod rasterizer;
mod spellcheck;
mod tables;
mod text;
mod traits;

pub use enhancer::{EnhancementOptions, ImageEnhancer};
pub use ocr::OcrBackend;
pub use rasterizer::PageRasterizer;
pub use spellcheck::SpellChecker;
pub use tables::TableDetector;
pub use text::{TextExtraction, TextExtractionEngine};
pub use traits::Plugin;
