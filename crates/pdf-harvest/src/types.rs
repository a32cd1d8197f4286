//! Result types produced by one pipeline run.
//!
//! All types serialize to camelCase JSON; that JSON object is the only wire
//! format the crate owns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::tables::{FormattedTable, TableBoundingBox};

/// The single output record of an extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Concatenated document text, or OCR text when the text layer was empty.
    pub text: String,

    /// Set when no text could be obtained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<PageImage>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<FormattedTable>>,

    /// OCR text before post-correction, kept when correction ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_ocr_text: Option<String>,

    /// OCR language used in single-language mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_language: Option<String>,

    /// OCR languages used in multi-language mode, primary first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_languages: Option<Vec<String>>,

    /// `true` when OCR languages were auto-detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_language_detection: Option<bool>,

    /// Engine codes chosen by auto-detection, in order of first use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_detected_languages: Option<Vec<String>>,

    /// Percentage of OCR paragraphs per detected engine language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_language_stats: Option<BTreeMap<String, u32>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_classification: Option<DocumentClassification>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_fields: Option<IndexMap<String, FieldValue>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_extraction_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_extraction_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_classification_error: Option<String>,

    pub performance: PerformanceMetrics,
}

impl ExtractionResult {
    /// Serialize the result as the JSON object handed back to the host.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Document-level metadata from the probe pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Entries of the document information dictionary (Title, Author, Producer, ...).
    pub info: BTreeMap<String, String>,

    /// Raw XMP metadata packet, if the catalog carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    pub number_of_pages: u32,

    /// PDF header version, e.g. `1.7`.
    pub version: String,
}

/// One rasterized page, encoded as a PNG data URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageImage {
    pub page: u32,
    pub image_data: String,
}

/// Outcome of keyword-scored document classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentClassification {
    /// One of the candidate categories, or `unknown`.
    pub document_type: String,

    /// 0-100 share of the winning category's score.
    pub confidence: u8,

    pub detected_fields: IndexMap<String, String>,
}

impl DocumentClassification {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        Self {
            document_type: Self::UNKNOWN.to_string(),
            confidence: 0,
            detected_fields: IndexMap::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.document_type == Self::UNKNOWN
    }
}

/// A value produced by field extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    LineItems(Vec<LineItem>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::LineItems(_) => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// An invoice line recovered from an item table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
}

/// Timing of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Wall-clock time formatted as seconds with two decimals, e.g. `1.25s`.
    pub processing_time: String,
    pub pages_processed: usize,
    pub pages_per_second: f64,
}

impl PerformanceMetrics {
    pub fn from_elapsed(elapsed: std::time::Duration, pages_processed: usize) -> Self {
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 { pages_processed as f64 / secs } else { 0.0 };

        Self {
            processing_time: format!("{:.2}s", secs),
            pages_processed,
            pages_per_second: (rate * 100.0).round() / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_result_serializes_camel_case_and_skips_none() {
        let result = ExtractionResult {
            text: "hello".to_string(),
            ocr_error: Some("engine crashed".to_string()),
            ..Default::default()
        };

        let json = result.to_json().unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["ocrError"], "engine crashed");
        assert!(json.get("warning").is_none());
        assert!(json.get("tables").is_none());
        assert!(json.get("performance").is_some());
    }

    #[test]
    fn test_performance_metrics_formatting() {
        let metrics = PerformanceMetrics::from_elapsed(Duration::from_millis(2500), 10);
        assert_eq!(metrics.processing_time, "2.50s");
        assert_eq!(metrics.pages_processed, 10);
        assert_eq!(metrics.pages_per_second, 4.0);
    }

    #[test]
    fn test_performance_metrics_zero_elapsed() {
        let metrics = PerformanceMetrics::from_elapsed(Duration::ZERO, 3);
        assert_eq!(metrics.processing_time, "0.00s");
        assert_eq!(metrics.pages_per_second, 0.0);
    }

    #[test]
    fn test_field_value_untagged_serialization() {
        let text = serde_json::to_value(FieldValue::Text("INV-1".into())).unwrap();
        assert_eq!(text, serde_json::json!("INV-1"));

        let items = serde_json::to_value(FieldValue::LineItems(vec![LineItem {
            description: "Widget".into(),
            quantity: Some("2".into()),
            price: None,
            total: Some("$10".into()),
        }]))
        .unwrap();
        assert_eq!(
            items,
            serde_json::json!([{"description": "Widget", "quantity": "2", "total": "$10"}])
        );
    }

    #[test]
    fn test_unknown_classification() {
        let classification = DocumentClassification::unknown();
        assert!(classification.is_unknown());
        assert_eq!(classification.confidence, 0);
        assert!(classification.detected_fields.is_empty());
    }
}
