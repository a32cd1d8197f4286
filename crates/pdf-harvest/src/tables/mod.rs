//! Table normalization.
//!
//! Table detectors return raw cell grids per page. [`format_tables`] turns them
//! into [`FormattedTable`]s with a header row, raw rows and one header→value
//! record per row.
//!
//! ```markdown
//! | Item | Qty |
//! |------|------|
//! | Widget | 2 |
//! ```

use crate::core::config::TableOptions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raw output of a table detector for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTableResult {
    pub page_tables: Vec<RawPageTables>,
    pub num_pages: u32,
}

/// Raw tables found on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPageTables {
    /// 1-based page number.
    pub page: u32,
    pub tables: Vec<RawTable>,
}

/// A raw cell grid, first row usually being the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub cells: Vec<Vec<String>>,
    pub bbox: Option<TableBoundingBox>,
}

impl RawTable {
    pub fn new(cells: Vec<Vec<String>>) -> Self {
        Self { cells, bbox: None }
    }
}

/// Table bounds in PDF user-space points, origin bottom-left.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TableBoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A normalized table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormattedTable {
    pub page_number: u32,
    pub table_index: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// One record per row; keys are exactly `headers`, missing cells are empty strings.
    pub data: Vec<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<TableBoundingBox>,
}

impl FormattedTable {
    /// RFC 4180 CSV with the header line first.
    pub fn to_csv(&self) -> String {
        std::iter::once(&self.headers)
            .chain(self.rows.iter())
            .map(|row| row.iter().map(|cell| csv_field(cell)).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("\r\n")
    }

    /// GitHub-flavored Markdown table.
    pub fn to_markdown(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut markdown = String::new();

        markdown.push_str("| ");
        markdown.push_str(
            &self
                .headers
                .iter()
                .map(|h| markdown_cell(h))
                .collect::<Vec<_>>()
                .join(" | "),
        );
        markdown.push_str(" |\n");

        markdown.push('|');
        for _ in 0..self.headers.len() {
            markdown.push_str("------|");
        }
        markdown.push('\n');

        for row in &self.rows {
            let cells: Vec<String> = (0..self.headers.len())
                .map(|i| markdown_cell(row.get(i).map(String::as_str).unwrap_or("")))
                .collect();
            markdown.push_str("| ");
            markdown.push_str(&cells.join(" | "));
            markdown.push_str(" |\n");
        }

        markdown
    }
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn markdown_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// Normalize raw grids into formatted tables, in page then table order.
///
/// Empty grids contribute nothing. Repeated header cells are renamed so every
/// column keeps its own key in the row records.
pub fn format_tables(raw: &RawTableResult, options: &TableOptions) -> Vec<FormattedTable> {
    let mut formatted = Vec::new();

    for page in &raw.page_tables {
        for (table_index, table) in page.tables.iter().enumerate() {
            if table.cells.is_empty() {
                continue;
            }

            let (headers, rows) = if options.use_first_row_as_headers {
                (unique_headers(&table.cells[0]), table.cells[1..].to_vec())
            } else {
                let width = table.cells.iter().map(Vec::len).max().unwrap_or(0);
                let generated = (1..=width).map(|i| format!("Column {}", i)).collect();
                (generated, table.cells.clone())
            };

            let data = rows
                .iter()
                .map(|row| {
                    headers
                        .iter()
                        .enumerate()
                        .map(|(i, header)| (header.clone(), row.get(i).cloned().unwrap_or_default()))
                        .collect()
                })
                .collect();

            formatted.push(FormattedTable {
                page_number: page.page,
                table_index,
                headers,
                rows,
                data,
                bbox: if options.include_row_coordinates { table.bbox } else { None },
            });
        }
    }

    formatted
}

/// A repeated blank header becomes `Column N`; any other repeat gets a ` (2)`, ` (3)`, ... suffix.
fn unique_headers(row: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    row.iter()
        .enumerate()
        .map(|(i, header)| {
            if seen.insert(header.clone()) {
                return header.clone();
            }
            let base = if header.trim().is_empty() {
                format!("Column {}", i + 1)
            } else {
                header.clone()
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{} ({})", base, n);
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    fn single_page(cells: Vec<Vec<String>>) -> RawTableResult {
        RawTableResult {
            page_tables: vec![RawPageTables {
                page: 1,
                tables: vec![RawTable::new(cells)],
            }],
            num_pages: 1,
        }
    }

    #[test]
    fn test_empty_inputs() {
        let options = TableOptions::default();
        assert!(format_tables(&RawTableResult::default(), &options).is_empty());
        assert!(
            format_tables(
                &RawTableResult {
                    page_tables: vec![],
                    num_pages: 3
                },
                &options
            )
            .is_empty()
        );
        assert!(format_tables(&single_page(vec![]), &options).is_empty());
    }

    #[test]
    fn test_header_row_and_records() {
        let raw = single_page(grid(&[&["H1", "H2"], &["a", "b"], &["c", "d"]]));
        let tables = format_tables(&raw, &TableOptions::default());

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.page_number, 1);
        assert_eq!(table.table_index, 0);
        assert_eq!(table.headers, vec!["H1", "H2"]);
        assert_eq!(table.rows, grid(&[&["a", "b"], &["c", "d"]]));
        assert_eq!(table.data.len(), 2);
        assert_eq!(table.data[0]["H1"], "a");
        assert_eq!(table.data[0]["H2"], "b");
        assert_eq!(table.data[1]["H1"], "c");
        assert_eq!(table.data[1]["H2"], "d");
    }

    #[test]
    fn test_missing_cells_default_to_empty() {
        let raw = single_page(grid(&[&["A", "B", "C"], &["1"]]));
        let table = &format_tables(&raw, &TableOptions::default())[0];

        let keys: Vec<_> = table.data[0].keys().cloned().collect();
        assert_eq!(keys, table.headers);
        assert_eq!(table.data[0]["B"], "");
        assert_eq!(table.data[0]["C"], "");
    }

    #[test]
    fn test_repeated_headers_keep_every_column() {
        let raw = single_page(grid(&[
            &["Amount", "", "Amount", "", "Amount (2)"],
            &["1", "2", "3", "4", "5"],
        ]));
        let table = &format_tables(&raw, &TableOptions::default())[0];

        assert_eq!(table.headers, vec!["Amount", "", "Amount (2)", "Column 4", "Amount (2) (2)"]);
        let values: Vec<&str> = table.data[0].values().map(String::as_str).collect();
        assert_eq!(values, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(table.rows[0].len(), table.data[0].len());
    }

    #[test]
    fn test_generated_headers() {
        let raw = single_page(grid(&[&["x", "y"], &["1", "2", "3"]]));
        let options = TableOptions {
            use_first_row_as_headers: false,
            include_row_coordinates: false,
        };
        let table = &format_tables(&raw, &options)[0];

        assert_eq!(table.headers, vec!["Column 1", "Column 2", "Column 3"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.data[0]["Column 3"], "");
    }

    #[test]
    fn test_bbox_only_when_requested() {
        let mut raw = single_page(grid(&[&["H"], &["v"]]));
        raw.page_tables[0].tables[0].bbox = Some(TableBoundingBox {
            x: 10.0,
            y: 20.0,
            width: 300.0,
            height: 90.0,
        });

        assert!(format_tables(&raw, &TableOptions::default())[0].bbox.is_none());

        let options = TableOptions {
            use_first_row_as_headers: true,
            include_row_coordinates: true,
        };
        assert_eq!(format_tables(&raw, &options)[0].bbox.map(|b| b.width), Some(300.0));
    }

    #[test]
    fn test_to_csv_quotes_fields() {
        let raw = single_page(grid(&[&["Name", "Note"], &["Widget, large", "say \"hi\""]]));
        let table = &format_tables(&raw, &TableOptions::default())[0];

        assert_eq!(table.to_csv(), "Name,Note\r\n\"Widget, large\",\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_to_markdown() {
        let raw = single_page(grid(&[&["Item", "Qty"], &["Widget", "2"], &["a|b"]]));
        let table = &format_tables(&raw, &TableOptions::default())[0];

        assert_eq!(
            table.to_markdown(),
            "| Item | Qty |\n|------|------|\n| Widget | 2 |\n| a\\|b |  |\n"
        );
    }
}
