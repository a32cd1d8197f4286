//! Custom document templates.
//!
//! A template directory holds `*.json` files. Each may declare keywords for
//! classification, field patterns for extraction, or both:
//!
//! ```json
//! {
//!   "type": "purchase_order",
//!   "keywords": ["purchase order", "po number", "ship to"],
//!   "fields": { "poNumber": ["po\\s*(?:#|number)[:\\s]*([A-Z0-9-]+)"] }
//! }
//! ```
//!
//! Unreadable or malformed files are skipped with a warning.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DocumentTemplate {
    #[serde(rename = "type", default)]
    pub document_type: Option<String>,

    #[serde(default)]
    pub keywords: Option<Vec<String>>,

    /// Field name to candidate regex patterns, tried in order.
    #[serde(default)]
    pub fields: Option<IndexMap<String, Vec<String>>>,
}

/// Read and parse one template file, logging and returning `None` on any failure.
pub fn read_template(path: &Path) -> Option<DocumentTemplate> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read document template");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(template) => Some(template),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping malformed document template");
            None
        }
    }
}

/// Keyword templates in `dir`, in file name order.
///
/// Only templates with both `type` and `keywords` are returned. A missing
/// directory yields no templates.
pub fn load_keyword_templates(dir: &Path) -> Vec<(String, Vec<String>)> {
    template_files(dir)
        .iter()
        .filter_map(|path| read_template(path))
        .filter_map(|template| match (template.document_type, template.keywords) {
            (Some(document_type), Some(keywords)) => Some((document_type, keywords)),
            _ => None,
        })
        .collect()
}

/// The field template `{dir}/{document_type}.json`, if it exists and declares `fields`.
pub fn load_field_template(dir: &Path, document_type: &str) -> Option<IndexMap<String, Vec<String>>> {
    let path = dir.join(format!("{}.json", document_type));
    if !path.is_file() {
        return None;
    }
    read_template(&path)?.fields
}

fn template_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if dir.exists() {
                tracing::warn!(dir = %dir.display(), error = %e, "Could not list custom templates");
            }
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
