use std::fmt;

#[derive(Debug, Clone)]
pub enum PdfError {
    InvalidPdf(String),
    Encrypted,
    PageNotFound(u32),
    TextExtractionFailed(String),
    RenderingFailed(String),
    MetadataExtractionFailed(String),
    IOError(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::InvalidPdf(msg) => write!(f, "Invalid PDF: {}", msg),
            PdfError::Encrypted => write!(f, "PDF is encrypted"),
            PdfError::PageNotFound(page) => write!(f, "Page {} not found", page),
            PdfError::TextExtractionFailed(msg) => write!(f, "Text extraction failed: {}", msg),
            PdfError::RenderingFailed(msg) => write!(f, "Page rendering failed: {}", msg),
            PdfError::MetadataExtractionFailed(msg) => {
                write!(f, "Metadata extraction failed: {}", msg)
            }
            PdfError::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PdfError {}

// NOTE: No From<std::io::Error> impl - IO errors must bubble up unchanged

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(io_err) => PdfError::IOError(io_err.to_string()),
            _ => PdfError::InvalidPdf(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HarvestError;

    #[test]
    fn test_invalid_pdf_error() {
        let err = PdfError::InvalidPdf("corrupted header".to_string());
        assert_eq!(err.to_string(), "Invalid PDF: corrupted header");
    }

    #[test]
    fn test_page_not_found_error() {
        let err = PdfError::PageNotFound(7);
        assert_eq!(err.to_string(), "Page 7 not found");
    }

    #[test]
    fn test_rendering_failed_error() {
        let err = PdfError::RenderingFailed("pdftoppm exited with status 1".to_string());
        assert_eq!(err.to_string(), "Page rendering failed: pdftoppm exited with status 1");
    }

    #[test]
    fn test_conversion_into_harvest_error() {
        let err: HarvestError = PdfError::Encrypted.into();
        assert!(matches!(err, HarvestError::EncryptedDocument));

        let err: HarvestError = PdfError::InvalidPdf("trailer missing".into()).into();
        assert!(matches!(err, HarvestError::CorruptDocument { .. }));

        let err: HarvestError = PdfError::RenderingFailed("no bitmap".into()).into();
        assert!(matches!(err, HarvestError::ImageExtractionFailed { .. }));

        let err: HarvestError = PdfError::TextExtractionFailed("bad stream".into()).into();
        assert!(matches!(err, HarvestError::TextExtractionFailed { .. }));

        let err: HarvestError = PdfError::IOError("disk full".into()).into();
        assert!(matches!(err, HarvestError::Io(_)));
    }

    #[test]
    fn test_lopdf_parse_error_is_invalid_pdf() {
        let err = lopdf::Document::load_mem(b"definitely not a pdf").unwrap_err();
        let pdf_err: PdfError = err.into();
        assert!(matches!(pdf_err, PdfError::InvalidPdf(_) | PdfError::IOError(_)));
    }
}
