//! Positioned text items from page content streams.
//!
//! Walks the text operators of a page while tracking the current
//! transformation and text matrices, producing one [`TextItem`] per shown
//! string. Coordinates are PDF user space with the origin at the bottom-left.

use super::error::{PdfError, Result};
use super::metadata::decode_text_string;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

/// Average glyph advance as a fraction of the font size, used to estimate widths.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Line advance for `T*` and `'` when no leading is set.
const DEFAULT_LEADING: f32 = 1.2;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Estimated from the character count and font size.
    pub width: f32,
    pub font_size: f32,
    /// 1-based page number.
    pub page: u32,
}

impl TextItem {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Items sharing a baseline, sorted left to right.
#[derive(Debug, Clone)]
pub struct TextRow {
    pub y: f32,
    pub items: Vec<TextItem>,
}

impl TextRow {
    pub fn height(&self) -> f32 {
        self.items.iter().map(|item| item.font_size).fold(0.0, f32::max)
    }
}

fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn operand_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

fn scaled_font_size(base: f32, matrix: &[f32; 6]) -> f32 {
    let scale_x = (matrix[0].powi(2) + matrix[1].powi(2)).sqrt();
    let scale_y = (matrix[2].powi(2) + matrix[3].powi(2)).sqrt();
    base * scale_x.max(scale_y)
}

struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    font_size: f32,
    leading: Option<f32>,
    in_text: bool,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 12.0,
            leading: None,
            in_text: false,
        }
    }

    fn next_line(&mut self) {
        self.line_matrix[5] -= self.leading.unwrap_or(self.font_size * DEFAULT_LEADING);
        self.text_matrix = self.line_matrix;
    }

    fn emit(&self, text: String, page: u32, items: &mut Vec<TextItem>) {
        if !self.in_text || text.trim().is_empty() {
            return;
        }
        let font_size = scaled_font_size(self.font_size, &self.text_matrix);
        let combined = multiply_matrices(&self.text_matrix, &self.ctm);
        let width = text.chars().count() as f32 * font_size * AVG_GLYPH_WIDTH;
        items.push(TextItem {
            text,
            x: combined[4],
            y: combined[5],
            width,
            font_size,
            page,
        });
    }
}

/// Positioned text items of one page.
pub fn extract_page_items(document: &Document, page_id: ObjectId, page: u32) -> Result<Vec<TextItem>> {
    let data = document
        .get_page_content(page_id)
        .map_err(|e| PdfError::TextExtractionFailed(format!("Page {}: {}", page, e)))?;
    let content = Content::decode(&data).map_err(|e| PdfError::TextExtractionFailed(format!("Page {}: {}", page, e)))?;

    let mut state = TextState::new();
    let mut items = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" if operands.len() >= 6 => {
                let mut matrix = IDENTITY;
                for (i, operand) in operands.iter().take(6).enumerate() {
                    matrix[i] = get_number(operand).unwrap_or(IDENTITY[i]);
                }
                state.ctm = multiply_matrices(&matrix, &state.ctm);
            }
            "BT" => {
                state.in_text = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "ET" => state.in_text = false,
            "Tf" if operands.len() >= 2 => {
                if let Some(size) = get_number(&operands[1]) {
                    state.font_size = size;
                }
            }
            "TL" => state.leading = operands.first().and_then(get_number),
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = get_number(&operands[0]).unwrap_or(0.0);
                let ty = get_number(&operands[1]).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = Some(-ty);
                }
                state.line_matrix = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, ty], &state.line_matrix);
                state.text_matrix = state.line_matrix;
            }
            "Tm" if operands.len() >= 6 => {
                for (i, operand) in operands.iter().take(6).enumerate() {
                    state.text_matrix[i] = get_number(operand).unwrap_or(IDENTITY[i]);
                }
                state.line_matrix = state.text_matrix;
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(operand_text) {
                    state.emit(text, page, &mut items);
                }
            }
            "TJ" => {
                if let Some(Ok(array)) = operands.first().map(Object::as_array) {
                    let text: String = array.iter().filter_map(operand_text).collect();
                    state.emit(text, page, &mut items);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(operand_text) {
                    state.emit(text, page, &mut items);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(operand_text) {
                    state.emit(text, page, &mut items);
                }
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Group items into rows whose baselines differ by at most `tolerance`.
///
/// Rows are returned top to bottom; items within a row left to right.
pub fn group_into_rows(mut items: Vec<TextItem>, tolerance: f32) -> Vec<TextRow> {
    items.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<TextRow> = Vec::new();
    for item in items {
        match rows.last_mut() {
            Some(row) if (row.y - item.y).abs() <= tolerance => row.items.push(item),
            _ => rows.push(TextRow {
                y: item.y,
                items: vec![item],
            }),
        }
    }

    for row in &mut rows {
        row.items.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}
