//! Keyword-scored document classification.
//!
//! Every candidate category has a keyword list. A category scores one point per
//! whole-word, case-insensitive occurrence of each of its keywords. The
//! highest-scoring category wins; on a tie the category considered first
//! keeps the lead. Confidence is the winner's share of the total score.
//!
//! Custom `*.json` templates can add categories or replace the keywords of a
//! built-in one (see [`templates`]).
//!
//! # Example
//!
//! ```rust
//! use pdf_harvest::classification::classify;
//!
//! let text = "INVOICE\nInvoice #: INV-12345\nTotal: $1000.00";
//! let categories = vec!["invoice".to_string(), "receipt".to_string(), "contract".to_string()];
//! let result = classify(text, &categories, None).unwrap();
//! assert_eq!(result.document_type, "invoice");
//! assert!(result.confidence > 60);
//! ```

pub mod fields;
pub mod templates;

pub use fields::{detected_fields, extract_document_fields, extract_invoice_line_items};

use crate::types::DocumentClassification;
use crate::{HarvestError, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;

/// Confidence above which detected fields are attached.
pub const FIELD_DETECTION_CONFIDENCE: u8 = 60;

const DEFAULT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "invoice",
        &[
            "invoice",
            "bill",
            "payment",
            "due date",
            "total amount",
            "tax",
            "customer",
            "invoice number",
            "qty",
            "quantity",
        ],
    ),
    (
        "receipt",
        &[
            "receipt",
            "payment received",
            "paid",
            "total",
            "cash",
            "change",
            "thank you",
            "customer copy",
            "merchant",
            "transaction",
        ],
    ),
    (
        "contract",
        &[
            "agreement",
            "contract",
            "terms",
            "conditions",
            "parties",
            "signed",
            "signature",
            "hereby",
            "clause",
            "legal",
        ],
    ),
    (
        "report",
        &[
            "report",
            "analysis",
            "summary",
            "conclusion",
            "findings",
            "data",
            "results",
            "evaluation",
            "assessment",
            "recommendation",
        ],
    ),
    (
        "resume",
        &[
            "resume",
            "cv",
            "curriculum vitae",
            "experience",
            "education",
            "skills",
            "references",
            "employment",
            "university",
            "certification",
        ],
    ),
    (
        "letter",
        &[
            "dear",
            "sincerely",
            "regards",
            "to whom it may concern",
            "letterhead",
            "date",
            "address",
            "signature",
            "subject",
            "attachment",
        ],
    ),
];

/// Built-in keywords, extended or overridden by the templates in `custom_dir`.
pub fn keyword_table(custom_dir: Option<&Path>) -> IndexMap<String, Vec<String>> {
    let mut table: IndexMap<String, Vec<String>> = DEFAULT_KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            (
                category.to_string(),
                keywords.iter().map(|k| k.to_string()).collect(),
            )
        })
        .collect();

    if let Some(dir) = custom_dir {
        for (category, keywords) in templates::load_keyword_templates(dir) {
            tracing::debug!(category = %category, keywords = keywords.len(), "Loaded custom template");
            table.insert(category, keywords);
        }
    }

    table
}

/// Number of whole-word occurrences of `keywords` in the lowercased `text`.
fn score(text: &str, keywords: &[String]) -> Result<usize> {
    let mut total = 0;
    for keyword in keywords {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(&keyword.to_lowercase()));
        let regex = Regex::new(&pattern).map_err(|e| {
            HarvestError::classification_failed_with_source(format!("Invalid keyword '{}'", keyword), e)
        })?;
        total += regex.find_iter(text).count();
    }
    Ok(total)
}

/// Classify `text` against `categories`.
///
/// An empty `categories` list considers every known category. Categories
/// without keywords are ignored. Fields are detected only when the
/// confidence exceeds [`FIELD_DETECTION_CONFIDENCE`].
///
/// # Errors
///
/// `ClassificationFailed` if a keyword cannot be turned into a matcher.
pub fn classify(text: &str, categories: &[String], custom_dir: Option<&Path>) -> Result<DocumentClassification> {
    let table = keyword_table(custom_dir);
    let normalized = text.to_lowercase();

    let candidates: Vec<&str> = if categories.is_empty() {
        table.keys().map(String::as_str).collect()
    } else {
        categories.iter().map(String::as_str).collect()
    };

    let mut best: Option<(&str, usize)> = None;
    let mut total = 0usize;
    for category in candidates {
        let Some(keywords) = table.get(category) else {
            tracing::debug!(category, "Skipping category without keywords");
            continue;
        };
        let category_score = score(&normalized, keywords)?;
        total += category_score;
        if category_score > best.map_or(0, |(_, high)| high) {
            best = Some((category, category_score));
        }
    }

    let Some((document_type, best_score)) = best else {
        return Ok(DocumentClassification::unknown());
    };

    let confidence = ((best_score as f64 / total as f64) * 100.0).round().min(100.0) as u8;
    let detected = if confidence > FIELD_DETECTION_CONFIDENCE {
        detected_fields(text, document_type)
    } else {
        IndexMap::new()
    };

    tracing::debug!(document_type, confidence, score = best_score, "Document classified");

    Ok(DocumentClassification {
        document_type: document_type.to_string(),
        confidence,
        detected_fields: detected,
    })
}
