//! Helpers for normalizing extracted text.

use regex::Regex;
use std::sync::OnceLock;

fn ordinal_regex() -> &'static Regex {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    ORDINAL.get_or_init(|| Regex::new(r"^\s*(\d+)[.)]\s*(.*)$").expect("ordinal pattern"))
}

/// Trim and collapse every whitespace run (newlines included) to a single space.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional table cell, mapping `None` to an empty string.
pub(crate) fn normalize_cell(cell: Option<&String>) -> String {
    cell.map(|value| normalize_whitespace(value))
        .unwrap_or_default()
}

/// Split a leading ordinal (`"12. Foo"` or `"12) Foo"`) off a title.
///
/// Returns the parsed ordinal, if any, and the remainder trimmed. Titles without an ordinal
/// come back whole.
pub fn split_ordinal(title: &str) -> (Option<u32>, String) {
    match ordinal_regex().captures(title) {
        Some(captures) => {
            let ordinal = captures.get(1).and_then(|m| m.as_str().parse().ok());
            let rest = captures.get(2).map_or("", |m| m.as_str()).trim();
            (ordinal, rest.to_string())
        }
        None => (None, title.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("  a\n\tb   c "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn normalize_cell_handles_missing_cells() {
        assert_eq!(normalize_cell(None), "");
        assert_eq!(normalize_cell(Some(&" x \n y ".to_string())), "x y");
    }

    #[test]
    fn split_ordinal_strips_number() {
        assert_eq!(
            split_ordinal("12. Standar Pelayanan Cetak Bukti SPP"),
            (Some(12), "Standar Pelayanan Cetak Bukti SPP".to_string())
        );
        assert_eq!(
            split_ordinal(" 7) Legalisir Ijazah"),
            (Some(7), "Legalisir Ijazah".to_string())
        );
        assert_eq!(
            split_ordinal("Standar Pelayanan"),
            (None, "Standar Pelayanan".to_string())
        );
    }
}
