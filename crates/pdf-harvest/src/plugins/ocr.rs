//! OCR backend trait.

use crate::Result;
use crate::plugins::Plugin;
use async_trait::async_trait;

/// Adapter over a text-from-image recognition engine.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use pdf_harvest::plugins::{OcrBackend, Plugin};
/// use pdf_harvest::Result;
///
/// struct EchoOcr;
///
/// impl Plugin for EchoOcr {
///     fn name(&self) -> &str { "echo-ocr" }
///     fn version(&self) -> String { "1.0.0".to_string() }
///     fn initialize(&self) -> Result<()> { Ok(()) }
///     fn shutdown(&self) -> Result<()> { Ok(()) }
/// }
///
/// #[async_trait]
/// impl OcrBackend for EchoOcr {
///     async fn recognize(&self, image: &[u8], languages: &[String]) -> Result<String> {
///         Ok(format!("{} bytes in {}", image.len(), languages.join("+")))
///     }
/// }
/// ```
#[async_trait]
pub trait OcrBackend: Plugin {
    /// Recognize text in a PNG image using one or more engine language codes.
    ///
    /// Failures are reported as `HarvestError::OcrFailed` carrying the engine's message.
    async fn recognize(&self, image: &[u8], languages: &[String]) -> Result<String>;

    /// Whether the engine has data for `lang`. Unknown backends accept everything.
    fn supports_language(&self, _lang: &str) -> bool {
        true
    }
}
