//! Core orchestration.
//!
//! - **Configuration** ([`config`]): `ProcessingOptions` and its loaders
//! - **I/O** ([`io`]): input loading, size and encryption checks, temp-file materialization
//! - **Pipeline** ([`pipeline`]): the [`PdfPipeline`] that runs every stage
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf_harvest::core::{PdfPipeline, ProcessingOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> pdf_harvest::Result<()> {
//! let pipeline = PdfPipeline::builder().build()?;
//! let result = pipeline
//!     .extract(PathBuf::from("document.pdf"), &ProcessingOptions::default())
//!     .await?;
//! println!("Extracted text: {}", result.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod io;
pub mod pipeline;

pub use config::{
    CorrectionLevel, FeatureFlags, LanguageHandling, OcrOptions, OcrQuality, PageSelectionOptions,
    PerformanceOptions, ProcessingOptions, RecognitionOptions, TableOptions,
};
pub use io::{InputSource, PdfInput};
pub use pipeline::{PdfPipeline, PdfPipelineBuilder};
