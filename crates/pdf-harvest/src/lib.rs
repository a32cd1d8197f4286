//! pdf-harvest - PDF content extraction and document classification
//!
//! One call runs a PDF through text extraction (optionally chunked), metadata
//! collection, page rasterization, table detection, OCR with language
//! detection and post-correction, and keyword-scored classification with
//! field extraction. Every stage is optional and, under `continueOnError`,
//! fails independently of the others.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pdf_harvest::{ProcessingOptions, extract_pdf_sync};
//! use std::path::PathBuf;
//!
//! # fn main() -> pdf_harvest::Result<()> {
//! let mut options = ProcessingOptions::default();
//! options.features.perform_ocr = true;
//! options.recognition.detect_document_type = true;
//!
//! let result = extract_pdf_sync(PathBuf::from("scan.pdf"), &options)?;
//! println!("{}", result.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): options, input loading, the [`PdfPipeline`] orchestrator
//! - **Adapters** (`plugins`): traits for every external engine, swappable through the pipeline builder
//! - **PDF** (`pdf`): lopdf text and table engines, Poppler/Pdfium rasterizers
//! - **OCR** (`ocr`): Tesseract backend, per-page cache, multi-language orchestration
//! - **Text** (`text`): post-OCR correction and spellchecking
//! - **Classification** (`classification`): document typing and field extraction

#![deny(unsafe_code)]

pub mod classification;
pub mod core;
pub mod error;
pub mod imaging;
pub mod language_detection;
pub mod ocr;
pub mod pages;
pub mod pdf;
pub mod plugins;
pub mod tables;
pub mod text;
pub mod types;
pub mod utils;

pub use error::{HarvestError, Result, Stage};
pub use types::*;

pub use core::config::ProcessingOptions;
pub use core::io::InputSource;
pub use core::pipeline::{PdfPipeline, PdfPipelineBuilder};

use once_cell::sync::Lazy;
use std::time::Duration;

/// Runtime behind the synchronous wrappers.
///
/// Creating it can only fail when the process cannot spawn threads, in which
/// case no extraction could proceed anyway.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Extract everything `options` asks for with the default engines.
///
/// Builds a fresh [`PdfPipeline`] whose OCR cache uses `options.ocr.cache_ttl_secs`.
/// Reuse a pipeline directly to share the cache across calls.
///
/// # Errors
///
/// See [`PdfPipeline::extract`]; additionally `MissingDependency` when a
/// default engine cannot be initialized.
pub async fn extract_pdf(source: impl Into<InputSource>, options: &ProcessingOptions) -> Result<ExtractionResult> {
    let pipeline = PdfPipeline::builder()
        .cache_ttl(Duration::from_secs(options.ocr.cache_ttl_secs))
        .build()?;
    pipeline.extract(source, options).await
}

/// Synchronous wrapper for [`extract_pdf`] on a shared runtime.
///
/// Must not be called from inside an async context.
pub fn extract_pdf_sync(source: impl Into<InputSource>, options: &ProcessingOptions) -> Result<ExtractionResult> {
    GLOBAL_RUNTIME.block_on(extract_pdf(source, options))
}
