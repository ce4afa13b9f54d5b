//! Record title detection from positioned words.
//!
//! Words are grouped into text lines by vertical proximity and each line, top to bottom, is
//! tested against the title patterns. The first match wins; a page holds at most one title.

use regex::Regex;
use std::sync::OnceLock;

use crate::extraction::PositionedWord;

use super::sanitize::{normalize_whitespace, split_ordinal};

/// Default vertical tolerance for grouping words into a line.
pub const DEFAULT_LINE_TOLERANCE: f64 = 3.0;

/// Header phrase every regular title carries after its ordinal.
const HEADER_PHRASE: &str = "STANDAR PELAYANAN";

/// Titles known to omit the header phrase on their own page.
const TITLE_EXCEPTIONS: &[&str] = &[r"^50\.\s*pengunduran diri bagi dosen"];

fn generic_title_regex() -> &'static Regex {
    static GENERIC: OnceLock<Regex> = OnceLock::new();
    GENERIC.get_or_init(|| Regex::new(r"^\d+\.\s*standar pelayanan").expect("title pattern"))
}

fn exception_regexes() -> &'static [Regex] {
    static EXCEPTIONS: OnceLock<Vec<Regex>> = OnceLock::new();
    EXCEPTIONS.get_or_init(|| {
        TITLE_EXCEPTIONS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("title exception pattern"))
            .collect()
    })
}

/// A reconstructed text line with the top coordinate of its anchor word.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Top coordinate of the first word of the line.
    pub top: f64,
    /// Words joined by single spaces.
    pub text: String,
}

/// Title found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTitle {
    /// Title text, ordinal included.
    pub text: String,
    /// Vertical offset of the title line.
    pub top: f64,
}

/// Decides whether a page starts a new record.
#[derive(Debug, Clone, Copy)]
pub struct TitleDetector {
    tolerance: f64,
}

impl Default for TitleDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_TOLERANCE)
    }
}

impl TitleDetector {
    /// Build a detector grouping words whose tops differ by at most `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }

    /// Return the page's title and its vertical offset, if any line looks like one.
    pub fn detect(&self, words: &[PositionedWord]) -> Option<DetectedTitle> {
        group_lines(words, self.tolerance)
            .into_iter()
            .find_map(|line| {
                match_title(&line.text).map(|text| DetectedTitle {
                    text,
                    top: line.top,
                })
            })
    }
}

/// Sort words by (top, x0) and group them into lines around each line's first word.
pub fn group_lines(words: &[PositionedWord], tolerance: f64) -> Vec<TextLine> {
    let mut sorted: Vec<&PositionedWord> = words.iter().collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<(f64, Vec<&PositionedWord>)> = Vec::new();
    for word in sorted {
        match lines.last_mut() {
            Some((anchor, members)) if (word.top - *anchor).abs() <= tolerance => {
                members.push(word);
            }
            _ => lines.push((word.top, vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(top, mut members)| {
            // Words a fraction lower than the anchor still read left to right.
            members.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            let text = members
                .iter()
                .map(|word| word.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            TextLine {
                top,
                text: normalize_whitespace(&text),
            }
        })
        .collect()
}

/// Test one line against the exception table, then the generic pattern.
fn match_title(line: &str) -> Option<String> {
    let lowered = line.to_lowercase();
    if exception_regexes().iter().any(|re| re.is_match(&lowered)) {
        return Some(synthesize_title(line));
    }
    if generic_title_regex().is_match(&lowered) {
        return Some(line.to_string());
    }
    None
}

fn synthesize_title(line: &str) -> String {
    match split_ordinal(line) {
        (Some(ordinal), rest) => format!("{ordinal}. {HEADER_PHRASE} {rest}"),
        (None, rest) => format!("{HEADER_PHRASE} {rest}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f64, top: f64) -> PositionedWord {
        PositionedWord::new(text, x0, top)
    }

    #[test]
    fn groups_words_within_tolerance() {
        let words = vec![
            word("Pelayanan", 60.0, 101.5),
            word("12.", 10.0, 100.0),
            word("Standar", 30.0, 102.0),
            word("Persyaratan", 10.0, 140.0),
        ];
        let lines = group_lines(&words, 3.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "12. Standar Pelayanan");
        assert_eq!(lines[0].top, 100.0);
        assert_eq!(lines[1].text, "Persyaratan");
    }

    #[test]
    fn tolerance_bound_is_inclusive() {
        let words = vec![
            word("7.", 10.0, 100.0),
            word("Standar", 30.0, 103.0),
            word("Pelayanan", 80.0, 103.5),
        ];
        let lines = group_lines(&words, DEFAULT_LINE_TOLERANCE);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "7. Standar");
        assert_eq!(lines[1].text, "Pelayanan");
        assert_eq!(lines[1].top, 103.5);
    }

    #[test]
    fn detects_generic_title() {
        let words = vec![
            word("Lampiran", 10.0, 40.0),
            word("12.", 10.0, 120.0),
            word("Standar", 30.0, 120.4),
            word("Pelayanan", 80.0, 120.2),
            word("Cetak", 140.0, 121.0),
            word("Bukti", 180.0, 120.0),
            word("SPP", 220.0, 119.5),
        ];
        let title = TitleDetector::default().detect(&words).expect("title");
        assert_eq!(title.text, "12. Standar Pelayanan Cetak Bukti SPP");
        assert_eq!(title.top, 119.5);
    }

    #[test]
    fn synthesizes_exceptional_title() {
        let words = vec![
            word("50.", 10.0, 80.0),
            word("PENGUNDURAN", 30.0, 80.0),
            word("DIRI", 120.0, 80.0),
            word("BAGI", 160.0, 80.0),
            word("DOSEN", 200.0, 80.0),
        ];
        let title = TitleDetector::default().detect(&words).expect("title");
        assert_eq!(
            title.text,
            "50. STANDAR PELAYANAN PENGUNDURAN DIRI BAGI DOSEN"
        );
        assert_eq!(title.top, 80.0);
    }

    #[test]
    fn first_matching_line_wins() {
        let words = vec![
            word("4.", 10.0, 300.0),
            word("Standar", 30.0, 300.0),
            word("Pelayanan", 80.0, 300.0),
            word("B", 140.0, 300.0),
            word("3.", 10.0, 50.0),
            word("Standar", 30.0, 50.0),
            word("Pelayanan", 80.0, 50.0),
            word("A", 140.0, 50.0),
        ];
        let title = TitleDetector::default().detect(&words).expect("title");
        assert_eq!(title.text, "3. Standar Pelayanan A");
    }

    #[test]
    fn ignores_pages_without_titles() {
        let words = vec![
            word("Standar", 30.0, 50.0),
            word("Pelayanan", 80.0, 50.0),
            word("tanpa", 10.0, 90.0),
            word("nomor", 40.0, 90.0),
        ];
        assert!(TitleDetector::default().detect(&words).is_none());
        assert!(TitleDetector::default().detect(&[]).is_none());
    }
}
