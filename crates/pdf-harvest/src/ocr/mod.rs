//! OCR subsystem.
//!
//! [`OcrEngine`] drives page-by-page recognition over any [`PageRasterizer`]
//! and [`OcrBackend`] pair. The production backend shells out to the
//! `tesseract` CLI; recognized text is cached per page image.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf_harvest::core::config::OcrOptions;
//! use pdf_harvest::imaging::PixelEnhancer;
//! use pdf_harvest::ocr::{OcrCache, OcrEngine, TesseractCliBackend};
//! use pdf_harvest::pdf::PdftoppmRasterizer;
//! use pdf_harvest::text::{DictionarySpellChecker, OcrPostProcessor};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> pdf_harvest::Result<()> {
//! let engine = OcrEngine::new(
//!     Arc::new(PdftoppmRasterizer::new()),
//!     Arc::new(TesseractCliBackend::new()),
//!     Arc::new(PixelEnhancer::new()),
//!     Arc::new(OcrPostProcessor::new(Arc::new(DictionarySpellChecker::new()))),
//!     Arc::new(OcrCache::default()),
//! );
//!
//! let outcome = engine.run(Path::new("scanned.pdf"), &[1, 2], &OcrOptions::default(), false).await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```
//!
//! [`PageRasterizer`]: crate::plugins::PageRasterizer
//! [`OcrBackend`]: crate::plugins::OcrBackend

pub mod cache;
pub mod engine;
pub mod error;
pub mod tesseract;
pub mod utils;
pub mod validation;

pub use cache::{OcrCache, OcrCacheStats};
pub use engine::{OcrEngine, OcrOutcome};
pub use error::OcrError;
pub use tesseract::TesseractCliBackend;
pub use validation::{is_supported_language, validate_languages};
