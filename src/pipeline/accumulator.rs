//! The open-record state machine.
//!
//! At most one record is open at a time. Rows merge into the open record's per-category text
//! until the page loop flushes it, either because the next title appeared or because the page
//! stream ended. A flushed record is handed out by value and never reopened.

use std::collections::BTreeMap;
use thiserror::Error;

use super::taxonomy::Category;

/// Errors raised by [`RecordAccumulator`] transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccumulatorError {
    /// `open` was called while another record was still open.
    #[error("record '{open}' is still open; flush it before opening '{requested}'")]
    AlreadyOpen {
        /// Title of the record that is open.
        open: String,
        /// Title that was requested.
        requested: String,
    },
}

/// Snapshot of a record at flush time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedRecord {
    /// Title as detected, ordinal included.
    pub title: String,
    /// Page on which the title was detected.
    pub start_page: usize,
    /// Accumulated text per category; absent categories never received a row.
    pub sections: BTreeMap<Category, String>,
}

impl FlushedRecord {
    /// Accumulated text for `category`, or the empty string.
    pub fn section(&self, category: Category) -> &str {
        self.sections.get(&category).map_or("", String::as_str)
    }
}

/// Result of a [`RecordAccumulator::merge_row`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The text was appended.
    Appended,
    /// The category text already contained the fragment; nothing changed.
    Duplicate,
    /// The fragment was empty after trimming.
    Empty,
    /// No record was open to receive the row.
    NoOpenRecord,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Empty,
    Open(FlushedRecord),
}

/// Holds the single record under construction.
#[derive(Debug, Default)]
pub struct RecordAccumulator {
    state: State,
}

impl RecordAccumulator {
    /// Start with no record open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record is currently open.
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Title of the open record, if any.
    pub fn open_title(&self) -> Option<&str> {
        match &self.state {
            State::Open(record) => Some(record.title.as_str()),
            State::Empty => None,
        }
    }

    /// Open a record for `title` starting on `page`.
    ///
    /// Fails without touching state when a record is already open; callers flush first.
    pub fn open(&mut self, title: impl Into<String>, page: usize) -> Result<(), AccumulatorError> {
        let title = title.into();
        if let State::Open(record) = &self.state {
            return Err(AccumulatorError::AlreadyOpen {
                open: record.title.clone(),
                requested: title,
            });
        }
        self.state = State::Open(FlushedRecord {
            title,
            start_page: page,
            sections: BTreeMap::new(),
        });
        Ok(())
    }

    /// Append `text` to the open record's `category` text, separated by a single space.
    ///
    /// A fragment the category text already contains is skipped, so the same row extracted
    /// twice leaves the text unchanged.
    pub fn merge_row(&mut self, category: Category, text: &str) -> MergeOutcome {
        let State::Open(record) = &mut self.state else {
            return MergeOutcome::NoOpenRecord;
        };
        let text = text.trim();
        if text.is_empty() {
            return MergeOutcome::Empty;
        }
        let existing = record.sections.entry(category).or_default();
        if existing.is_empty() {
            existing.push_str(text);
            MergeOutcome::Appended
        } else if existing.contains(text) {
            MergeOutcome::Duplicate
        } else {
            existing.push(' ');
            existing.push_str(text);
            MergeOutcome::Appended
        }
    }

    /// Close the open record and return it; `None` when nothing was open.
    pub fn flush(&mut self) -> Option<FlushedRecord> {
        match std::mem::take(&mut self.state) {
            State::Open(record) => Some(record),
            State::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_merge_flush_cycle() {
        let mut acc = RecordAccumulator::new();
        assert!(!acc.is_open());
        acc.open("1. Standar Pelayanan A", 9).unwrap();
        assert_eq!(acc.open_title(), Some("1. Standar Pelayanan A"));
        assert_eq!(
            acc.merge_row(Category::Fee, "Gratis"),
            MergeOutcome::Appended
        );
        assert_eq!(
            acc.merge_row(Category::Fee, "tanpa biaya"),
            MergeOutcome::Appended
        );

        let record = acc.flush().expect("record");
        assert_eq!(record.start_page, 9);
        assert_eq!(record.section(Category::Fee), "Gratis tanpa biaya");
        assert_eq!(record.section(Category::Product), "");
        assert!(!acc.is_open());
        assert!(acc.flush().is_none());
    }

    #[test]
    fn duplicate_fragments_do_not_change_text() {
        let mut acc = RecordAccumulator::new();
        acc.open("2. Standar Pelayanan B", 10).unwrap();
        acc.merge_row(Category::Requirements, "a. KTM b. KRS");
        let outcome = acc.merge_row(Category::Requirements, "b. KRS");
        assert_eq!(outcome, MergeOutcome::Duplicate);
        let record = acc.flush().unwrap();
        assert_eq!(record.section(Category::Requirements), "a. KTM b. KRS");
    }

    #[test]
    fn open_while_open_is_rejected_without_mutation() {
        let mut acc = RecordAccumulator::new();
        acc.open("1. Standar Pelayanan A", 9).unwrap();
        acc.merge_row(Category::Fee, "Gratis");
        let error = acc.open("2. Standar Pelayanan B", 11).unwrap_err();
        assert!(matches!(error, AccumulatorError::AlreadyOpen { .. }));
        let record = acc.flush().unwrap();
        assert_eq!(record.title, "1. Standar Pelayanan A");
        assert_eq!(record.section(Category::Fee), "Gratis");
    }

    #[test]
    fn merge_without_open_record_is_reported() {
        let mut acc = RecordAccumulator::new();
        assert_eq!(
            acc.merge_row(Category::Fee, "Gratis"),
            MergeOutcome::NoOpenRecord
        );
        acc.open("1. Standar Pelayanan A", 9).unwrap();
        assert_eq!(acc.merge_row(Category::Fee, "   "), MergeOutcome::Empty);
        assert!(!acc.flush().unwrap().sections.contains_key(&Category::Fee));
    }
}
