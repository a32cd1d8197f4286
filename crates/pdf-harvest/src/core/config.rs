//! Configuration loading and management.
//!
//! [`ProcessingOptions`] is the single, strongly-typed snapshot of everything a
//! run can be asked to do. It is built once (programmatically or from a TOML,
//! YAML or JSON file), validated, and then shared read-only by every stage.

use crate::{HarvestError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Name of the file [`ProcessingOptions::discover`] looks for.
pub const CONFIG_FILE_NAME: &str = "pdf-harvest.toml";

/// Default document categories considered by classification.
pub const DEFAULT_CATEGORIES: [&str; 6] = ["invoice", "receipt", "contract", "report", "resume", "letter"];

/// Main processing configuration.
///
/// # Example
///
/// ```rust
/// use pdf_harvest::core::config::ProcessingOptions;
///
/// let mut options = ProcessingOptions::default();
/// options.features.extract_tables = true;
/// options.pages.page_range = Some("1-3".to_string());
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    #[serde(default)]
    pub pages: PageSelectionOptions,

    #[serde(default)]
    pub performance: PerformanceOptions,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub ocr: OcrOptions,

    #[serde(default)]
    pub tables: TableOptions,

    #[serde(default)]
    pub recognition: RecognitionOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageSelectionOptions {
    /// Range expression such as `1-3,5`. Empty or absent selects every page.
    #[serde(default)]
    pub page_range: Option<String>,

    /// Restrict processing to the first selected page.
    #[serde(default)]
    pub first_page_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceOptions {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: f64,

    /// Pages per text extraction chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default)]
    pub process_in_chunks: bool,

    #[serde(default)]
    pub show_progress: bool,

    /// Downgrade feature failures into result fields instead of aborting.
    #[serde(default)]
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub extract_text: bool,

    #[serde(default)]
    pub include_metadata: bool,

    #[serde(default)]
    pub extract_images: bool,

    /// Run OCR even when the text layer is not empty.
    #[serde(default)]
    pub perform_ocr: bool,

    #[serde(default)]
    pub extract_tables: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LanguageHandling {
    #[default]
    Single,
    Multiple,
    Auto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OcrQuality {
    Fast,
    Balanced,
    Accurate,
}

impl OcrQuality {
    /// Rasterization scale; 1.0 renders one pixel per PDF point.
    pub fn scale(self) -> f32 {
        match self {
            OcrQuality::Fast => 1.0,
            OcrQuality::Balanced => 1.5,
            OcrQuality::Accurate => 2.0,
        }
    }

    /// Resolution for engines configured by DPI.
    pub fn dpi(self) -> u32 {
        match self {
            OcrQuality::Fast => 150,
            OcrQuality::Balanced => 200,
            OcrQuality::Accurate => 300,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionLevel {
    Light,
    #[default]
    Medium,
    Aggressive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcrOptions {
    #[serde(default)]
    pub language_handling: LanguageHandling,

    /// Primary OCR engine language code.
    #[serde(default = "default_eng")]
    pub language: String,

    /// Extra languages for `multiple` mode.
    #[serde(default)]
    pub additional_languages: Vec<String>,

    #[serde(default)]
    pub quality: Option<OcrQuality>,

    /// Preprocess rendered pages before recognition.
    #[serde(default)]
    pub enhance_image: bool,

    /// Post-correct recognized text.
    #[serde(default)]
    pub enhance_results: bool,

    #[serde(default)]
    pub correction_level: CorrectionLevel,

    /// ISO 639-1 spellcheck language. Derived from `language` when unset.
    #[serde(default)]
    pub spell_check_language: Option<String>,

    #[serde(default)]
    pub parallel: bool,

    /// Batch size for parallel OCR. Defaults to the number of CPUs.
    #[serde(default)]
    pub max_workers: Option<usize>,

    #[serde(default = "default_true")]
    pub use_cache: bool,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Explicit rasterization scale; overrides `quality`.
    #[serde(default)]
    pub scale: Option<f32>,
}

impl OcrOptions {
    /// Scale pages are rendered at before recognition.
    pub fn render_scale(&self) -> f32 {
        self.scale
            .or(self.quality.map(OcrQuality::scale))
            .unwrap_or(crate::ocr::utils::DEFAULT_OCR_SCALE)
    }

    pub fn effective_max_workers(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    #[serde(default = "default_true")]
    pub use_first_row_as_headers: bool,

    #[serde(default)]
    pub include_row_coordinates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionOptions {
    #[serde(default)]
    pub detect_document_type: bool,

    #[serde(default)]
    pub extract_form_fields: bool,

    /// Candidate categories, in tie-break order. Accepts a list or a comma-separated string.
    #[serde(default = "default_categories", deserialize_with = "deserialize_categories")]
    pub categories: Vec<String>,

    /// Directory of `*.json` classification and field templates.
    #[serde(default)]
    pub custom_templates_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_max_file_size_mb() -> f64 {
    100.0
}
fn default_chunk_size() -> usize {
    10
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn deserialize_categories<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Categories {
        Joined(String),
        List(Vec<String>),
    }

    let raw = match Categories::deserialize(deserializer)? {
        Categories::Joined(joined) => joined.split(',').map(str::to_string).collect::<Vec<_>>(),
        Categories::List(list) => list,
    };

    Ok(raw
        .into_iter()
        .map(|category| category.trim().to_lowercase())
        .filter(|category| !category.is_empty())
        .collect())
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            chunk_size: default_chunk_size(),
            process_in_chunks: false,
            show_progress: false,
            continue_on_error: false,
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            extract_text: true,
            include_metadata: false,
            extract_images: false,
            perform_ocr: false,
            extract_tables: false,
        }
    }
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language_handling: LanguageHandling::default(),
            language: default_eng(),
            additional_languages: Vec::new(),
            quality: None,
            enhance_image: false,
            enhance_results: false,
            correction_level: CorrectionLevel::default(),
            spell_check_language: None,
            parallel: false,
            max_workers: None,
            use_cache: true,
            cache_ttl_secs: default_cache_ttl_secs(),
            scale: None,
        }
    }
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            use_first_row_as_headers: true,
            include_row_coordinates: false,
        }
    }
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            detect_document_type: false,
            extract_form_fields: false,
            categories: default_categories(),
            custom_templates_path: None,
        }
    }
}

impl ProcessingOptions {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Validation` if file doesn't exist or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        toml::from_str(&content)
            .map_err(|e| HarvestError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| HarvestError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_json::from_str(&content)
            .map_err(|e| HarvestError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, choosing the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(HarvestError::validation(format!(
                "Unsupported config file format: {}. Expected .toml, .yaml, .yml or .json",
                path.display()
            ))),
        }
    }

    /// Discover `pdf-harvest.toml` in the current directory or its parents.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(HarvestError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Reject option combinations no stage can honor.
    pub fn validate(&self) -> Result<()> {
        if self.performance.chunk_size == 0 {
            return Err(HarvestError::validation("chunkSize must be at least 1"));
        }

        let max_mb = self.performance.max_file_size_mb;
        if max_mb.is_nan() || max_mb <= 0.0 {
            return Err(HarvestError::validation(format!(
                "maxFileSizeMb must be positive, got {}",
                self.performance.max_file_size_mb
            )));
        }

        if self.ocr.language.trim().is_empty() {
            return Err(HarvestError::validation("OCR language must not be empty"));
        }

        if self.ocr.max_workers == Some(0) {
            return Err(HarvestError::validation("maxWorkers must be at least 1"));
        }

        if let Some(scale) = self.ocr.scale
            && (scale.is_nan() || scale <= 0.0)
        {
            return Err(HarvestError::validation(format!("OCR scale must be positive, got {}", scale)));
        }

        if self.recognition.categories.iter().any(|c| c.trim().is_empty()) {
            return Err(HarvestError::validation("Document categories must not be empty strings"));
        }

        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| HarvestError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
