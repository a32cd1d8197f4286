//! Tesseract OCR through its command-line interface.
//!
//! The page image is piped to `tesseract stdin stdout`, so no temporary file
//! is written for recognition.

use super::error::OcrError;
use super::utils::join_languages;
use super::validation::{is_supported_language, validate_languages};
use crate::Result;
use crate::plugins::{OcrBackend, Plugin};
use crate::utils::{CommandError, run_command};
use async_trait::async_trait;

const TESSERACT: &str = "tesseract";

pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 120;

/// Default page segmentation mode: fully automatic, no OSD.
pub const DEFAULT_PSM: u8 = 3;

#[derive(Debug, Clone)]
pub struct TesseractCliBackend {
    psm: u8,
    timeout_secs: u64,
}

impl Default for TesseractCliBackend {
    fn default() -> Self {
        Self {
            psm: DEFAULT_PSM,
            timeout_secs: DEFAULT_OCR_TIMEOUT_SECS,
        }
    }
}

impl TesseractCliBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn command_args(&self, languages: &[String]) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            join_languages(languages),
            "--psm".to_string(),
            self.psm.to_string(),
        ]
    }

    async fn run(&self, image: &[u8], languages: &[String]) -> std::result::Result<String, OcrError> {
        validate_languages(languages)?;

        let output = run_command(TESSERACT, self.command_args(languages), Some(image), self.timeout_secs)
            .await
            .map_err(|e| match e {
                CommandError::NotFound { .. } => {
                    OcrError::EngineUnavailable("tesseract is not installed or not in PATH".to_string())
                }
                CommandError::TimedOut { seconds, .. } => OcrError::Timeout(seconds),
                CommandError::Failed { stderr, .. } => OcrError::ProcessingFailed(stderr),
                CommandError::Io { source, .. } => OcrError::IOError(source.to_string()),
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Plugin for TesseractCliBackend {
    fn name(&self) -> &str {
        "tesseract-cli"
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
        "Runs the tesseract command-line tool on rendered pages"
    }
}

#[async_trait]
impl OcrBackend for TesseractCliBackend {
    async fn recognize(&self, image: &[u8], languages: &[String]) -> Result<String> {
        tracing::debug!(languages = %join_languages(languages), bytes = image.len(), "Running tesseract");
        Ok(self.run(image, languages).await?)
    }

    fn supports_language(&self, lang: &str) -> bool {
        is_supported_language(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HarvestError;

    #[test]
    fn test_command_args() {
        let backend = TesseractCliBackend::new().with_psm(6);
        let args = backend.command_args(&["eng".to_string(), "vie".to_string()]);
        assert_eq!(args, vec!["stdin", "stdout", "-l", "eng+vie", "--psm", "6"]);
    }

    #[test]
    fn test_supports_language() {
        let backend = TesseractCliBackend::new();
        assert!(backend.supports_language("chi_sim"));
        assert!(!backend.supports_language("klingon"));
    }

    #[tokio::test]
    async fn test_invalid_language_is_rejected_before_running() {
        let err = TesseractCliBackend::new()
            .recognize(b"png", &["klingon".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::OcrFailed { message, .. } if message.contains("klingon")));
    }
}
