//! Reading (label, text) pairs out of a component table.
//!
//! Component tables have a "Komponen" column naming the sub-section and an "Uraian" column
//! describing it. When the first row is a header its cells locate both columns; otherwise the
//! columns default to the second and third cell (the first holds the row number).

use crate::extraction::PositionedTable;

use super::sanitize::normalize_cell;

const DEFAULT_LABEL_COLUMN: usize = 1;
const DEFAULT_TEXT_COLUMN: usize = 2;

/// One non-empty row of a component table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRow {
    /// Whitespace-normalized label cell.
    pub label: String,
    /// Whitespace-normalized description cell.
    pub text: String,
}

/// Extract the usable rows of `table` in order.
pub fn read_component_rows(table: &PositionedTable) -> Vec<LabeledRow> {
    let Some(header) = table.rows.first() else {
        return Vec::new();
    };

    let mut label_column = DEFAULT_LABEL_COLUMN;
    let mut text_column = DEFAULT_TEXT_COLUMN;
    let mut first_data_row = 0;

    let header_text = header
        .iter()
        .map(|cell| cell.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if header_text.contains("komponen") || header_text.contains("uraian") {
        for (index, cell) in header.iter().enumerate() {
            let lowered = cell.as_deref().unwrap_or("").to_lowercase();
            if lowered.contains("komponen") {
                label_column = index;
            }
            if lowered.contains("uraian") {
                text_column = index;
            }
        }
        first_data_row = 1;
    }

    table.rows[first_data_row..]
        .iter()
        .filter(|row| row.len() > label_column.max(text_column))
        .filter_map(|row| {
            let label = normalize_cell(row[label_column].as_ref());
            let text = normalize_cell(row[text_column].as_ref());
            if label.is_empty() || text.is_empty() {
                None
            } else {
                Some(LabeledRow { label, text })
            }
        })
        .collect()
}
