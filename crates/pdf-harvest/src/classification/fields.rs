//! Regex field extraction.
//!
//! Each field has an ordered list of candidate patterns. The first pattern
//! that matches wins and its first capture group, trimmed, is the value.
//! Later patterns are looser fallbacks, so order matters. A field without
//! any match is reported as an empty string.

use super::templates::load_field_template;
use crate::tables::FormattedTable;
use crate::types::{FieldValue, LineItem};
use crate::{HarvestError, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::path::Path;

type PatternTable = &'static [(&'static str, &'static [&'static str])];
type CompiledTable = Vec<(&'static str, Vec<Regex>)>;

/// Fields reported with a confident classification.
const DETECTED_INVOICE: PatternTable = &[
    (
        "invoiceNumber",
        &[
            r"(?i)invoice\s*(?:#|number|num|no)[:\s]*([A-Z0-9\-]+)",
            r"(?i)inv[:\s]*([A-Z0-9\-]+)",
        ],
    ),
    (
        "date",
        &[
            r"(?i)invoice\s*date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(?i)date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
    (
        "total",
        &[
            r"(?i)total[:\s]*(\$?\d+[,.\d]+)",
            r"(?i)amount\s*due[:\s]*(\$?\d+[,.\d]+)",
            r"(\$\d+[,.\d]+)",
        ],
    ),
];

const DETECTED_RECEIPT: PatternTable = &[
    (
        "receiptNumber",
        &[
            r"(?i)receipt\s*(?:#|number|num|no)[:\s]*([A-Z0-9\-]+)",
            r"(?i)transaction\s*(?:id|#|number)[:\s]*([A-Z0-9\-]+)",
        ],
    ),
    (
        "date",
        &[
            r"(?i)date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
    (
        "total",
        &[
            r"(?i)total[:\s]*(\$?\d+[,.\d]+)",
            r"(?i)amount[:\s]*(\$?\d+[,.\d]+)",
            r"(\$\d+[,.\d]+)",
        ],
    ),
];

const DETECTED_CONTRACT: PatternTable = &[
    ("parties", &[r"(?i)between\s*(.*?)\s*and\s*(.*?)(?:\s*dated|\s*\n|$)"]),
    (
        "effectiveDate",
        &[
            r"(?i)effective\s*date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(?i)dated[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
];

/// Fields produced by full field extraction.
const INVOICE: PatternTable = &[
    (
        "invoiceNumber",
        &[
            r"(?i)invoice\s*(?:#|number|num|no)[:\s]*([A-Z0-9\-]+)",
            r"(?i)inv[:\s]*([A-Z0-9\-]+)",
        ],
    ),
    (
        "date",
        &[
            r"(?i)invoice\s*date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(?i)date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
    (
        "dueDate",
        &[
            r"(?i)due\s*date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(?i)payment\s*due[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
    (
        "total",
        &[
            r"(?i)total[:\s]*(\$?\d+[,.\d]+)",
            r"(?i)amount\s*due[:\s]*(\$?\d+[,.\d]+)",
        ],
    ),
    (
        "tax",
        &[r"(?i)tax[:\s]*(\$?\d+[,.\d]+)", r"(?i)vat[:\s]*(\$?\d+[,.\d]+)"],
    ),
    (
        "subtotal",
        &[
            r"(?i)subtotal[:\s]*(\$?\d+[,.\d]+)",
            r"(?i)sub\s*total[:\s]*(\$?\d+[,.\d]+)",
        ],
    ),
];

const RECEIPT: PatternTable = &[
    (
        "receiptNumber",
        &[
            r"(?i)receipt\s*(?:#|number|num|no)[:\s]*([A-Z0-9\-]+)",
            r"(?i)transaction\s*(?:id|#|number)[:\s]*([A-Z0-9\-]+)",
        ],
    ),
    (
        "date",
        &[
            r"(?i)date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
    (
        "total",
        &[r"(?i)total[:\s]*(\$?\d+[,.\d]+)", r"(?i)amount[:\s]*(\$?\d+[,.\d]+)"],
    ),
    (
        "paymentMethod",
        &[r"(?i)payment\s*method[:\s]*(\w+)", r"(?i)paid\s*(?:by|with|via)[:\s]*(\w+)"],
    ),
];

const CONTRACT: PatternTable = &[
    (
        "effectiveDate",
        &[
            r"(?i)effective\s*date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(?i)agreement\s*date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
    ("parties", &[r"(?i)between\s*(.*?)\s*and\s*(.*?)(?:\s*dated|\s*\n|$)"]),
    (
        "terminationDate",
        &[
            r"(?i)termination\s*date[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
            r"(?i)expires\s*(?:on|at)[:\s]*(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})",
        ],
    ),
];

const RESUME: PatternTable = &[
    (
        "name",
        &[
            r"(?m)^([A-Z][a-z]+\s+[A-Z][a-z]+)",
            r"(?i)resume\s*of\s*([A-Z][a-z]+\s+[A-Z][a-z]+)",
        ],
    ),
    ("email", &[r"([a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,})"]),
    ("phone", &[r"(\+?[\d\-()\s]{10,20})"]),
];

fn compile(table: PatternTable) -> CompiledTable {
    table
        .iter()
        .map(|(field, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p).expect("Field regex pattern is valid and should compile"))
                .collect();
            (*field, compiled)
        })
        .collect()
}

static DETECTED_INVOICE_PATTERNS: Lazy<CompiledTable> = Lazy::new(|| compile(DETECTED_INVOICE));
static DETECTED_RECEIPT_PATTERNS: Lazy<CompiledTable> = Lazy::new(|| compile(DETECTED_RECEIPT));
static DETECTED_CONTRACT_PATTERNS: Lazy<CompiledTable> = Lazy::new(|| compile(DETECTED_CONTRACT));
static INVOICE_PATTERNS: Lazy<CompiledTable> = Lazy::new(|| compile(INVOICE));
static RECEIPT_PATTERNS: Lazy<CompiledTable> = Lazy::new(|| compile(RECEIPT));
static CONTRACT_PATTERNS: Lazy<CompiledTable> = Lazy::new(|| compile(CONTRACT));
static RESUME_PATTERNS: Lazy<CompiledTable> = Lazy::new(|| compile(RESUME));

static DESCRIPTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)description|item|product|service").expect("Description header regex pattern is valid and should compile")
});
static QUANTITY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)qty|quantity|amount").expect("Quantity header regex pattern is valid and should compile"));
static PRICE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)price|rate|cost").expect("Price header regex pattern is valid and should compile"));
static TOTAL_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)total|amount|sum").expect("Total header regex pattern is valid and should compile"));

/// First capture group of the first matching pattern, trimmed; empty when nothing matches.
///
/// A pattern whose group captured nothing defers to the next one. A group that
/// captured only whitespace still wins and yields an empty value.
pub fn extract_field_value(text: &str, patterns: &[Regex]) -> String {
    patterns
        .iter()
        .find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .filter(|m| !m.as_str().is_empty())
                .map(|m| m.as_str().trim().to_string())
        })
        .unwrap_or_default()
}

fn apply(text: &str, table: &CompiledTable) -> IndexMap<String, String> {
    table
        .iter()
        .map(|(field, patterns)| (field.to_string(), extract_field_value(text, patterns)))
        .collect()
}

/// Fields attached to a confident classification. Categories without default
/// fields yield an empty map.
pub fn detected_fields(text: &str, document_type: &str) -> IndexMap<String, String> {
    match document_type {
        "invoice" => apply(text, &DETECTED_INVOICE_PATTERNS),
        "receipt" => apply(text, &DETECTED_RECEIPT_PATTERNS),
        "contract" => apply(text, &DETECTED_CONTRACT_PATTERNS),
        _ => IndexMap::new(),
    }
}

/// Extract the fields of a `document_type` document.
///
/// A `{custom_dir}/{document_type}.json` template with `fields` takes
/// precedence over the built-in patterns. Its patterns are case-insensitive.
/// A template with an invalid pattern is ignored with a warning.
///
/// Invoices additionally get `lineItems` when one of `tables` looks like an
/// item list.
pub fn extract_document_fields(
    text: &str,
    tables: &[FormattedTable],
    document_type: &str,
    custom_dir: Option<&Path>,
) -> Result<IndexMap<String, FieldValue>> {
    if let Some(dir) = custom_dir
        && let Some(template) = load_field_template(dir, document_type)
    {
        match apply_template(text, &template) {
            Ok(fields) => return Ok(fields),
            Err(e) => {
                tracing::warn!(
                    document_type,
                    error = %e,
                    "Custom field template is invalid, using built-in patterns"
                );
            }
        }
    }

    let table = match document_type {
        "invoice" => &*INVOICE_PATTERNS,
        "receipt" => &*RECEIPT_PATTERNS,
        "contract" => &*CONTRACT_PATTERNS,
        "resume" => &*RESUME_PATTERNS,
        _ => return Ok(IndexMap::new()),
    };

    let mut fields: IndexMap<String, FieldValue> = apply(text, table)
        .into_iter()
        .map(|(name, value)| (name, FieldValue::Text(value)))
        .collect();

    if document_type == "invoice" {
        let items = extract_invoice_line_items(tables);
        if !items.is_empty() {
            fields.insert("lineItems".to_string(), FieldValue::LineItems(items));
        }
    }

    Ok(fields)
}

fn apply_template(text: &str, template: &IndexMap<String, Vec<String>>) -> Result<IndexMap<String, FieldValue>> {
    let mut fields = IndexMap::with_capacity(template.len());
    for (name, patterns) in template {
        let compiled = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p).case_insensitive(true).build().map_err(|e| {
                    HarvestError::classification_failed_with_source(
                        format!("Invalid pattern for field '{}': {}", name, p),
                        e,
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        fields.insert(name.clone(), FieldValue::Text(extract_field_value(text, &compiled)));
    }
    Ok(fields)
}

/// Line items from the first table whose headers name a description column.
///
/// Rows without any non-blank cell are skipped; absent or blank cells leave
/// the corresponding field unset.
pub fn extract_invoice_line_items(tables: &[FormattedTable]) -> Vec<LineItem> {
    for table in tables {
        if table.rows.is_empty() {
            continue;
        }
        let Some(description_idx) = table.headers.iter().position(|h| DESCRIPTION_HEADER.is_match(h)) else {
            continue;
        };
        let quantity_idx = table.headers.iter().position(|h| QUANTITY_HEADER.is_match(h));
        let price_idx = table.headers.iter().position(|h| PRICE_HEADER.is_match(h));
        let total_idx = table.headers.iter().position(|h| TOTAL_HEADER.is_match(h));

        let cell = |row: &[String], idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        };

        let items: Vec<LineItem> = table
            .rows
            .iter()
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .map(|row| LineItem {
                description: cell(row, Some(description_idx)).unwrap_or_default(),
                quantity: cell(row, quantity_idx),
                price: cell(row, price_idx),
                total: cell(row, total_idx),
            })
            .collect();

        if !items.is_empty() {
            return items;
        }
    }

    Vec::new()
}
