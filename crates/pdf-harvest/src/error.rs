//! Error types for pdf-harvest.
//!
//! Every fallible operation in the crate returns [`HarvestError`]. The variants
//! map one-to-one onto the failure kinds a caller has to distinguish:
//!
//! - **Structural** errors (`FileNotFound`, `FileTooLarge`, `EncryptedDocument`,
//!   `InvalidRangeFormat`, `PageOutOfRange`, `CorruptDocument`) mean the job cannot
//!   proceed at all. They are fatal even when continue-on-error is active.
//! - **Feature** errors (`OcrFailed`, `ImageExtractionFailed`, `TableExtractionFailed`,
//!   `ClassificationFailed`, ...) come from one optional stage. With continue-on-error
//!   they are downgraded into a `<feature>Error` field of the result.
//! - `Io` errors raised while loading the input bubble up unchanged; they indicate
//!   real system problems. Inside an optional stage every non-document error is
//!   re-expressed as that stage's error with [`HarvestError::in_stage`].
//!
//! # Example
//!
//! ```rust
//! use pdf_harvest::{HarvestError, Result};
//!
//! fn check_size(bytes: &[u8], max_mb: f64) -> Result<()> {
//!     let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
//!     if size_mb > max_mb {
//!         return Err(HarvestError::FileTooLarge { size_mb, max_mb });
//!     }
//!     Ok(())
//! }
//! ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `HarvestError`.
pub type Result<T> = std::result::Result<T, HarvestError>;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all pdf-harvest operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("File size ({size_mb:.2} MB) exceeds the maximum allowed size ({max_mb} MB)")]
    FileTooLarge { size_mb: f64, max_mb: f64 },

    #[error(
        "The PDF file appears to be encrypted or password protected. Protected PDFs cannot be processed."
    )]
    EncryptedDocument,

    #[error("Invalid page range: {0}")]
    InvalidRangeFormat(String),

    #[error("Page range includes page {page}, but the document only has {total} page(s)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Corrupt PDF document: {message}")]
    CorruptDocument {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("OCR processing failed: {message}")]
    OcrFailed {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Image extraction failed: {message}")]
    ImageExtractionFailed {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Table extraction failed: {message}")]
    TableExtractionFailed {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Image enhancement failed: {message}")]
    EnhancementFailed {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Language detection failed: {message}")]
    LanguageDetectionFailed {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Document classification failed: {message}")]
    ClassificationFailed {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Text extraction failed: {message}")]
    TextExtractionFailed {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::pdf::error::PdfError> for HarvestError {
    fn from(err: crate::pdf::error::PdfError) -> Self {
        use crate::pdf::error::PdfError;

        match err {
            PdfError::Encrypted => HarvestError::EncryptedDocument,
            PdfError::InvalidPdf(_) | PdfError::PageNotFound(_) => HarvestError::CorruptDocument {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
            PdfError::RenderingFailed(_) => HarvestError::ImageExtractionFailed {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
            PdfError::TextExtractionFailed(_) | PdfError::MetadataExtractionFailed(_) => {
                HarvestError::TextExtractionFailed {
                    message: err.to_string(),
                    source: Some(Box::new(err)),
                }
            }
            PdfError::IOError(msg) => HarvestError::Io(std::io::Error::other(msg)),
        }
    }
}

impl From<crate::ocr::error::OcrError> for HarvestError {
    fn from(err: crate::ocr::error::OcrError) -> Self {
        HarvestError::OcrFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Optional pipeline stages whose failures are reported under their own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ImageExtraction,
    TableExtraction,
    Ocr,
    Classification,
}

impl Stage {
    /// Name used in log events.
    pub fn label(self) -> &'static str {
        match self {
            Stage::ImageExtraction => "Image extraction",
            Stage::TableExtraction => "Table extraction",
            Stage::Ocr => "OCR",
            Stage::Classification => "Document classification",
        }
    }

    fn owns(self, error: &HarvestError) -> bool {
        matches!(
            (self, error),
            (Stage::ImageExtraction, HarvestError::ImageExtractionFailed { .. })
                | (Stage::TableExtraction, HarvestError::TableExtractionFailed { .. })
                | (Stage::Ocr, HarvestError::OcrFailed { .. })
                | (Stage::Classification, HarvestError::ClassificationFailed { .. })
        )
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl HarvestError {
    error_constructor!(corrupt_document, CorruptDocument);
    error_constructor!(ocr_failed, OcrFailed);
    error_constructor!(image_extraction_failed, ImageExtractionFailed);
    error_constructor!(table_extraction_failed, TableExtractionFailed);
    error_constructor!(enhancement_failed, EnhancementFailed);
    error_constructor!(language_detection_failed, LanguageDetectionFailed);
    error_constructor!(classification_failed, ClassificationFailed);
    error_constructor!(text_extraction_failed, TextExtractionFailed);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Stable machine-readable code for hosts that branch on error kind.
    pub fn code(&self) -> &'static str {
        match self {
            HarvestError::Io(_) => "ERR_IO",
            HarvestError::FileNotFound(_) => "ERR_FILE_NOT_FOUND",
            HarvestError::FileTooLarge { .. } => "ERR_FILE_TOO_LARGE",
            HarvestError::EncryptedDocument => "ERR_ENCRYPTED_DOCUMENT",
            HarvestError::InvalidRangeFormat(_) | HarvestError::PageOutOfRange { .. } => "ERR_INVALID_PAGE_RANGE",
            HarvestError::CorruptDocument { .. } => "ERR_CORRUPT_DOCUMENT",
            HarvestError::OcrFailed { .. } => "ERR_OCR_FAILED",
            HarvestError::ImageExtractionFailed { .. } => "ERR_IMAGE_EXTRACTION_FAILED",
            HarvestError::TableExtractionFailed { .. } => "ERR_TABLE_EXTRACTION_FAILED",
            HarvestError::EnhancementFailed { .. } => "ERR_ENHANCEMENT_FAILED",
            HarvestError::LanguageDetectionFailed { .. } => "ERR_LANG_DETECTION_FAILED",
            HarvestError::ClassificationFailed { .. } => "ERR_CLASSIFICATION_FAILED",
            HarvestError::TextExtractionFailed { .. } => "ERR_TEXT_EXTRACTION_FAILED",
            HarvestError::Validation { .. } => "ERR_VALIDATION",
            HarvestError::Serialization { .. } => "ERR_SERIALIZATION",
            HarvestError::MissingDependency(_) => "ERR_MISSING_DEPENDENCY",
            HarvestError::Other(_) => "ERR_UNKNOWN",
        }
    }

    /// Errors that abort a run even when continue-on-error is active.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HarvestError::Io(_)
                | HarvestError::FileNotFound(_)
                | HarvestError::FileTooLarge { .. }
                | HarvestError::EncryptedDocument
                | HarvestError::InvalidRangeFormat(_)
                | HarvestError::PageOutOfRange { .. }
                | HarvestError::CorruptDocument { .. }
                | HarvestError::Validation { .. }
        )
    }

    /// Errors about the document itself rather than about one stage.
    fn is_document_error(&self) -> bool {
        matches!(
            self,
            HarvestError::FileNotFound(_)
                | HarvestError::FileTooLarge { .. }
                | HarvestError::EncryptedDocument
                | HarvestError::InvalidRangeFormat(_)
                | HarvestError::PageOutOfRange { .. }
                | HarvestError::CorruptDocument { .. }
                | HarvestError::Validation { .. }
        )
    }

    /// Report a failure raised inside `stage` as that stage's error.
    ///
    /// Errors already of the stage's kind and errors about the document itself
    /// are returned as is. Anything else (a renderer failing during OCR, a
    /// missing engine binary, an I/O error on a scratch file) is wrapped with
    /// its full message, keeping the original as `source`.
    pub fn in_stage(self, stage: Stage) -> Self {
        if stage.owns(&self) || self.is_document_error() {
            return self;
        }

        let message = self.to_string();
        match stage {
            Stage::ImageExtraction => Self::image_extraction_failed_with_source(message, self),
            Stage::TableExtraction => Self::table_extraction_failed_with_source(message, self),
            Stage::Ocr => Self::ocr_failed_with_source(message, self),
            Stage::Classification => Self::classification_failed_with_source(message, self),
        }
    }

    /// The message without the variant prefix, used for result-level error fields.
    pub fn detail(&self) -> String {
        match self {
            HarvestError::CorruptDocument { message, .. }
            | HarvestError::OcrFailed { message, .. }
            | HarvestError::ImageExtractionFailed { message, .. }
            | HarvestError::TableExtractionFailed { message, .. }
            | HarvestError::EnhancementFailed { message, .. }
            | HarvestError::LanguageDetectionFailed { message, .. }
            | HarvestError::ClassificationFailed { message, .. }
            | HarvestError::TextExtractionFailed { message, .. }
            | HarvestError::Validation { message, .. }
            | HarvestError::Serialization { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HarvestError = io_err.into();
        assert!(matches!(err, HarvestError::Io(_)));
        assert!(err.to_string().contains("IO error"));
        assert_eq!(err.code(), "ERR_IO");
    }

    #[test]
    fn test_file_not_found_message() {
        let err = HarvestError::FileNotFound(PathBuf::from("/tmp/missing.pdf"));
        assert_eq!(err.to_string(), "PDF file not found: /tmp/missing.pdf");
        assert_eq!(err.code(), "ERR_FILE_NOT_FOUND");
    }

    #[test]
    fn test_file_too_large_message() {
        let err = HarvestError::FileTooLarge {
            size_mb: 150.456,
            max_mb: 100.0,
        };
        assert_eq!(
            err.to_string(),
            "File size (150.46 MB) exceeds the maximum allowed size (100 MB)"
        );
    }

    #[test]
    fn test_page_out_of_range_message() {
        let err = HarvestError::PageOutOfRange { page: 12, total: 3 };
        assert_eq!(
            err.to_string(),
            "Page range includes page 12, but the document only has 3 page(s)"
        );
        assert_eq!(err.code(), "ERR_INVALID_PAGE_RANGE");
    }

    #[test]
    fn test_ocr_failed_constructor() {
        let err = HarvestError::ocr_failed("engine crashed");
        assert_eq!(err.to_string(), "OCR processing failed: engine crashed");
        assert_eq!(err.detail(), "engine crashed");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_constructor_with_source() {
        let source = std::io::Error::other("tesseract exited with status 1");
        let err = HarvestError::ocr_failed_with_source("page 3", source);
        assert_eq!(err.to_string(), "OCR processing failed: page 3");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_structural_classification() {
        assert!(HarvestError::EncryptedDocument.is_structural());
        assert!(HarvestError::InvalidRangeFormat("x".into()).is_structural());
        assert!(HarvestError::corrupt_document("truncated").is_structural());
        assert!(!HarvestError::ocr_failed("x").is_structural());
        assert!(!HarvestError::table_extraction_failed("x").is_structural());
        assert!(!HarvestError::classification_failed("x").is_structural());
    }

    #[test]
    fn test_in_stage_wraps_foreign_errors() {
        let err = HarvestError::image_extraction_failed("renderer exited with status 1").in_stage(Stage::Ocr);
        assert_eq!(err.code(), "ERR_OCR_FAILED");
        assert_eq!(err.detail(), "Image extraction failed: renderer exited with status 1");
        assert!(!err.is_structural());

        let source = std::error::Error::source(&err).expect("original kept as source");
        assert_eq!(source.to_string(), "Image extraction failed: renderer exited with status 1");
    }

    #[test]
    fn test_in_stage_turns_io_into_stage_error() {
        let err = HarvestError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "no tmp"));
        assert!(err.is_structural());

        let err = err.in_stage(Stage::TableExtraction);
        assert_eq!(err.code(), "ERR_TABLE_EXTRACTION_FAILED");
        assert!(!err.is_structural());

        let err = HarvestError::MissingDependency("pdftoppm".into()).in_stage(Stage::ImageExtraction);
        assert_eq!(err.code(), "ERR_IMAGE_EXTRACTION_FAILED");
    }

    #[test]
    fn test_in_stage_keeps_own_and_document_errors() {
        let err = HarvestError::ocr_failed("engine crashed").in_stage(Stage::Ocr);
        assert_eq!(err.to_string(), "OCR processing failed: engine crashed");
        assert!(std::error::Error::source(&err).is_none());

        assert!(matches!(
            HarvestError::EncryptedDocument.in_stage(Stage::Ocr),
            HarvestError::EncryptedDocument
        ));
        assert!(matches!(
            HarvestError::corrupt_document("truncated").in_stage(Stage::TableExtraction),
            HarvestError::CorruptDocument { .. }
        ));
    }

    #[test]
    fn test_detail_for_unit_variants_uses_display() {
        let err = HarvestError::EncryptedDocument;
        assert!(err.detail().contains("encrypted"));
    }

    #[test]
    fn test_serde_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: HarvestError = json_err.into();
        assert!(matches!(err, HarvestError::Serialization { .. }));
        assert_eq!(err.code(), "ERR_SERIALIZATION");
    }

    #[test]
    fn test_error_codes_are_distinct_for_feature_errors() {
        let codes = [
            HarvestError::ocr_failed("a").code(),
            HarvestError::image_extraction_failed("a").code(),
            HarvestError::table_extraction_failed("a").code(),
            HarvestError::enhancement_failed("a").code(),
            HarvestError::language_detection_failed("a").code(),
            HarvestError::classification_failed("a").code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
