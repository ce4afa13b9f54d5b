//! Segmentation of enumerated procedure prose into steps.
//!
//! Grammar: a marker is a single lower-case ASCII letter followed by a period. It must start a
//! token (preceded by the start of text or whitespace) and be followed by whitespace, the end of
//! text, or the capital letter or digit that opens the step (`a.Mahasiswa`). A step is the text
//! between one marker and the next. Text before the first marker is preamble and is discarded.
//! Input with no marker yields no steps.

use regex::Regex;
use std::sync::OnceLock;

use super::sanitize::normalize_whitespace;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"[a-z]\.").expect("step marker pattern"))
}

/// Byte ranges of every marker token in `text`, in order of appearance.
fn marker_spans(text: &str) -> Vec<(usize, usize)> {
    marker_regex()
        .find_iter(text)
        .filter(|found| {
            let before = text[..found.start()].chars().next_back();
            let after = text[found.end()..].chars().next();
            before.is_none_or(char::is_whitespace) && after.is_none_or(opens_step)
        })
        .map(|found| (found.start(), found.end()))
        .collect()
}

fn opens_step(next: char) -> bool {
    next.is_whitespace() || next.is_uppercase() || next.is_ascii_digit()
}

/// Split procedure text into step descriptions, in marker order.
pub fn split_steps(procedure: &str) -> Vec<String> {
    let text = normalize_whitespace(procedure);
    let spans = marker_spans(&text);

    spans
        .iter()
        .enumerate()
        .filter_map(|(index, &(_, body_start))| {
            let body_end = spans
                .get(index + 1)
                .map_or(text.len(), |&(next_start, _)| next_start);
            let body = text[body_start..body_end].trim();
            (!body.is_empty()).then(|| body.to_string())
        })
        .collect()
}
