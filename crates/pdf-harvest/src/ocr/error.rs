use std::fmt;

/// Errors raised by OCR backends and the OCR stage.
#[derive(Debug, Clone)]
pub enum OcrError {
    /// The OCR engine binary or library could not be found or started.
    EngineUnavailable(String),
    InvalidLanguageCode(String),
    ImageProcessingFailed(String),
    ProcessingFailed(String),
    Timeout(u64),
    IOError(String),
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineUnavailable(msg) => write!(f, "OCR engine unavailable: {}", msg),
            Self::InvalidLanguageCode(msg) => write!(f, "Invalid language code: {}", msg),
            Self::ImageProcessingFailed(msg) => write!(f, "Image processing failed: {}", msg),
            Self::ProcessingFailed(msg) => write!(f, "{}", msg),
            Self::Timeout(secs) => write!(f, "OCR engine timed out after {} seconds", secs),
            Self::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}

// NOTE: No From<std::io::Error> impl - IO errors must bubble up unchanged
