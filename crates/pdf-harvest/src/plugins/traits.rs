//! Base plugin trait definition.
//!
//! Every engine adapter implements [`Plugin`], which provides identification and
//! lifecycle hooks. The pipeline calls `initialize` once when it is built and
//! `shutdown` when it is torn down.

use crate::Result;

/// Base trait that all engine adapters must implement.
///
/// # Thread Safety
///
/// Adapters are shared as `Arc<dyn Trait>` across OCR worker tasks and must be `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use pdf_harvest::plugins::Plugin;
/// use pdf_harvest::Result;
///
/// struct NoopAdapter;
///
/// impl Plugin for NoopAdapter {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     fn version(&self) -> String {
///         "1.0.0".to_string()
///     }
///
///     fn initialize(&self) -> Result<()> {
///         Ok(())
///     }
///
///     fn shutdown(&self) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Unique, lowercase, hyphenated identifier (e.g. `tesseract-cli`).
    fn name(&self) -> &str;

    fn version(&self) -> String;

    /// Called once before first use. Adapters check for their external engine here.
    fn initialize(&self) -> Result<()>;

    fn shutdown(&self) -> Result<()>;

    fn description(&self) -> &str {
        ""
    }
}
