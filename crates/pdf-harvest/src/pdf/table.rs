//! Table detection from positioned PDF text.
//!
//! Text items are grouped into rows by baseline. A run of consecutive rows
//! that each carry at least two items, with no large vertical gap between
//! them, is a table region. Column anchors are clustered from the item x
//! positions of the region and every item is assigned to the nearest anchor on
//! its left.

use super::error::{PdfError, Result};
use super::layout::{TextItem, TextRow, extract_page_items, group_into_rows};
use super::text::load_document;
use crate::plugins::{Plugin, TableDetector};
use crate::tables::{RawPageTables, RawTable, RawTableResult, TableBoundingBox};
use async_trait::async_trait;
use std::path::Path;

/// Baselines closer than this (points) belong to the same row.
const ROW_TOLERANCE: f32 = 3.0;

/// Items whose x positions differ by more than this (points) start a new column.
const COLUMN_GAP: f32 = 10.0;

/// Maximum distance between consecutive row baselines, relative to the row height.
const MAX_ROW_GAP_RATIO: f32 = 2.5;

const MIN_TABLE_ROWS: usize = 2;
const MIN_TABLE_COLUMNS: usize = 2;

/// Detect tables on `pages` (1-based), or on every page when `None`.
///
/// Requested pages that do not exist are skipped.
pub fn detect_tables_in_pdf(pdf_bytes: &[u8], pages: Option<&[u32]>) -> Result<RawTableResult> {
    let document = load_document(pdf_bytes)?;
    let available = document.get_pages();

    let selected: Vec<u32> = match pages {
        Some(pages) => pages.to_vec(),
        None => available.keys().copied().collect(),
    };

    let mut page_tables = Vec::new();
    for page in selected {
        let Some(&page_id) = available.get(&page) else {
            tracing::debug!(page, "Skipping table detection for missing page");
            continue;
        };

        let items = extract_page_items(&document, page_id, page)?;
        let tables = detect_tables_in_items(items);
        if !tables.is_empty() {
            page_tables.push(RawPageTables { page, tables });
        }
    }

    Ok(RawTableResult {
        page_tables,
        num_pages: available.len() as u32,
    })
}

/// Find table regions among the text items of one page.
pub fn detect_tables_in_items(items: Vec<TextItem>) -> Vec<RawTable> {
    let rows = group_into_rows(items, ROW_TOLERANCE);

    let mut tables = Vec::new();
    let mut region: Vec<&TextRow> = Vec::new();

    for row in &rows {
        let continues = row.items.len() >= MIN_TABLE_COLUMNS
            && region.last().is_none_or(|prev| {
                let limit = prev.height().max(row.height()) * MAX_ROW_GAP_RATIO;
                (prev.y - row.y).abs() <= limit
            });

        if continues {
            region.push(row);
            continue;
        }

        tables.extend(build_table(&region));
        region.clear();
        if row.items.len() >= MIN_TABLE_COLUMNS {
            region.push(row);
        }
    }
    tables.extend(build_table(&region));

    tables
}

fn column_anchors(region: &[&TextRow]) -> Vec<f32> {
    let mut xs: Vec<f32> = region.iter().flat_map(|row| row.items.iter().map(|i| i.x)).collect();
    xs.sort_by(f32::total_cmp);

    let mut anchors: Vec<f32> = Vec::new();
    let mut last: Option<f32> = None;
    for x in xs {
        if last.is_none_or(|prev| x - prev > COLUMN_GAP) {
            anchors.push(x);
        }
        last = Some(x);
    }
    anchors
}

fn build_table(region: &[&TextRow]) -> Option<RawTable> {
    if region.len() < MIN_TABLE_ROWS {
        return None;
    }

    let anchors = column_anchors(region);
    if anchors.len() < MIN_TABLE_COLUMNS {
        return None;
    }

    let cells: Vec<Vec<String>> = region
        .iter()
        .map(|row| {
            let mut cells = vec![String::new(); anchors.len()];
            for item in &row.items {
                let column = anchors.iter().rposition(|&anchor| anchor <= item.x).unwrap_or(0);
                let cell = &mut cells[column];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(item.text.trim());
            }
            cells
        })
        .collect();

    Some(RawTable {
        cells,
        bbox: Some(bounding_box(region)),
    })
}

fn bounding_box(region: &[&TextRow]) -> TableBoundingBox {
    let items = || region.iter().flat_map(|row| row.items.iter());

    let left = items().map(|i| i.x).fold(f32::INFINITY, f32::min);
    let right = items().map(TextItem::right).fold(f32::NEG_INFINITY, f32::max);
    let bottom = items().map(|i| i.y).fold(f32::INFINITY, f32::min);
    let top = items().map(|i| i.y + i.font_size).fold(f32::NEG_INFINITY, f32::max);

    TableBoundingBox {
        x: f64::from(left),
        y: f64::from(bottom),
        width: f64::from(right - left),
        height: f64::from(top - bottom),
    }
}

/// Table detector over the text layer, backed by lopdf.
///
/// Scanned pages without a text layer yield no tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutTableDetector;

impl LayoutTableDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for LayoutTableDetector {
    fn name(&self) -> &str {
        "layout-tables"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> crate::Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> crate::Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Detects tables from aligned text rows and columns"
    }
}

#[async_trait]
impl TableDetector for LayoutTableDetector {
    async fn detect_tables(&self, pdf_path: &Path, pages: Option<&[u32]>) -> crate::Result<RawTableResult> {
        let bytes = tokio::fs::read(pdf_path).await?;
        let pages_owned = pages.map(<[u32]>::to_vec);

        tokio::task::spawn_blocking(move || detect_tables_in_pdf(&bytes, pages_owned.as_deref()))
            .await
            .map_err(|e| crate::HarvestError::table_extraction_failed(format!("Table detection task failed: {}", e)))?
            .map_err(|e: PdfError| crate::HarvestError::table_extraction_failed_with_source(e.to_string(), e))
    }
}
