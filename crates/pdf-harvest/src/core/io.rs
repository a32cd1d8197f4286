//! Input resolution and validation.
//!
//! A run receives its PDF either as a path or as an in-memory buffer. Both are
//! normalized into a [`PdfInput`] after the size limit and the encryption marker
//! have been checked. A temporary copy on disk is only created when an adapter
//! asks for a path, and it is removed when the input is dropped.

use crate::{HarvestError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;

/// Prefix of temporary files created by the crate.
pub const TEMP_FILE_PREFIX: &str = "pdf_harvest_";

/// Size of the header region scanned for the encryption marker.
pub const ENCRYPTION_SCAN_BYTES: usize = 100;

const ENCRYPTION_MARKER: &[u8] = b"/Encrypt";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Where the PDF of one invocation comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for InputSource {
    fn from(path: PathBuf) -> Self {
        InputSource::Path(path)
    }
}

impl From<&Path> for InputSource {
    fn from(path: &Path) -> Self {
        InputSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for InputSource {
    fn from(bytes: Vec<u8>) -> Self {
        InputSource::Bytes(bytes)
    }
}

/// A loaded, validated PDF.
#[derive(Debug)]
pub struct PdfInput {
    bytes: Vec<u8>,
    path: Option<PathBuf>,
    temp: Option<NamedTempFile>,
}

impl PdfInput {
    /// Resolve `source`, enforcing the size limit before reading and rejecting encrypted documents.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the path does not exist
    /// - `FileTooLarge` if the input exceeds `max_file_size_mb`
    /// - `EncryptedDocument` if the header carries an encryption marker
    pub async fn load(source: InputSource, max_file_size_mb: f64) -> Result<Self> {
        let input = match source {
            InputSource::Path(path) => {
                let metadata = match fs::metadata(&path).await {
                    Ok(metadata) => metadata,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(HarvestError::FileNotFound(path));
                    }
                    Err(e) => return Err(HarvestError::Io(e)),
                };
                check_file_size(metadata.len(), max_file_size_mb)?;

                let bytes = fs::read(&path).await.map_err(HarvestError::Io)?;
                Self {
                    bytes,
                    path: Some(path),
                    temp: None,
                }
            }
            InputSource::Bytes(bytes) => {
                check_file_size(bytes.len() as u64, max_file_size_mb)?;
                Self {
                    bytes,
                    path: None,
                    temp: None,
                }
            }
        };

        check_encryption(&input.bytes)?;
        Ok(input)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / BYTES_PER_MB
    }

    /// Path of the PDF on disk, writing the buffer to a temporary file on first use.
    pub fn ensure_path(&mut self) -> Result<&Path> {
        if self.path.is_none() {
            let mut temp = tempfile::Builder::new()
                .prefix(TEMP_FILE_PREFIX)
                .suffix(".pdf")
                .tempfile()
                .map_err(HarvestError::Io)?;
            temp.write_all(&self.bytes).map_err(HarvestError::Io)?;
            temp.flush().map_err(HarvestError::Io)?;

            tracing::debug!(path = %temp.path().display(), "Materialized PDF buffer to temporary file");
            self.path = Some(temp.path().to_path_buf());
            self.temp = Some(temp);
        }

        match self.path.as_deref() {
            Some(path) => Ok(path),
            None => Err(HarvestError::Other("PDF input has no path".to_string())),
        }
    }

    /// `true` when the on-disk copy is a temporary file owned by this input.
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Fail with `FileTooLarge` when `size_bytes` exceeds `max_mb` megabytes.
pub fn check_file_size(size_bytes: u64, max_mb: f64) -> Result<()> {
    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    if size_mb > max_mb {
        return Err(HarvestError::FileTooLarge { size_mb, max_mb });
    }
    Ok(())
}

/// Fail with `EncryptedDocument` when the header region contains `/Encrypt`.
pub fn check_encryption(bytes: &[u8]) -> Result<()> {
    let header = &bytes[..bytes.len().min(ENCRYPTION_SCAN_BYTES)];
    if header
        .windows(ENCRYPTION_MARKER.len())
        .any(|window| window == ENCRYPTION_MARKER)
    {
        return Err(HarvestError::EncryptedDocument);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_encryption_detects_marker() {
        let bytes = b"%PDF-1.7\n1 0 obj << /Encrypt 5 0 R >> endobj".to_vec();
        assert!(matches!(check_encryption(&bytes), Err(HarvestError::EncryptedDocument)));
    }

    #[test]
    fn test_check_encryption_ignores_marker_past_header() {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.extend(std::iter::repeat_n(b' ', 200));
        bytes.extend_from_slice(b"/Encrypt");
        assert!(check_encryption(&bytes).is_ok());
    }

    #[test]
    fn test_check_encryption_short_buffer() {
        assert!(check_encryption(b"%PDF").is_ok());
        assert!(check_encryption(b"").is_ok());
    }

    #[test]
    fn test_check_file_size() {
        assert!(check_file_size(1024, 1.0).is_ok());
        let err = check_file_size(3 * 1024 * 1024, 2.0).unwrap_err();
        assert!(matches!(err, HarvestError::FileTooLarge { .. }));
        assert!(err.to_string().contains("3.00 MB"));
    }

    #[tokio::test]
    async fn test_load_missing_path() {
        let err = PdfInput::load(InputSource::Path("/nonexistent/file.pdf".into()), 100.0)
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_load_bytes_materializes_and_cleans_up() {
        let mut input = PdfInput::load(InputSource::Bytes(b"%PDF-1.4\n%%EOF".to_vec()), 100.0)
            .await
            .unwrap();
        assert!(!input.is_temporary());

        let path = input.ensure_path().unwrap().to_path_buf();
        assert!(path.exists());
        assert!(input.is_temporary());
        assert!(
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(TEMP_FILE_PREFIX))
        );

        drop(input);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_load_path_does_not_create_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("doc.pdf");
        std::fs::write(&pdf_path, b"%PDF-1.4\n%%EOF").unwrap();

        let mut input = PdfInput::load(InputSource::Path(pdf_path.clone()), 100.0).await.unwrap();
        assert_eq!(input.ensure_path().unwrap(), pdf_path.as_path());
        assert!(!input.is_temporary());
    }

    #[tokio::test]
    async fn test_load_rejects_large_bytes() {
        let err = PdfInput::load(InputSource::Bytes(vec![0u8; 2 * 1024 * 1024]), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::FileTooLarge { .. }));
    }
}
