//! The page loop: title detection, table attribution and accumulation for one document.

use crate::extraction::{PageLayout, PositionedTable};

use super::accumulator::{FlushedRecord, MergeOutcome, RecordAccumulator};
use super::attribution::attribute_tables;
use super::rows::read_component_rows;
use super::run::RunLog;
use super::taxonomy::normalize_label;
use super::title::TitleDetector;

/// Consumes pages in document order and emits records as they close.
#[derive(Debug, Default)]
pub struct PageScanner {
    detector: TitleDetector,
    accumulator: RecordAccumulator,
}

impl PageScanner {
    /// Scanner using `detector` for title lines.
    pub fn new(detector: TitleDetector) -> Self {
        Self {
            detector,
            accumulator: RecordAccumulator::new(),
        }
    }

    /// Whether a record is open at this point of the scan.
    pub fn has_open_record(&self) -> bool {
        self.accumulator.is_open()
    }

    /// Process one page; returns the record its title closed, if any.
    ///
    /// Tables above the title finish the previously open record before it is flushed; tables
    /// below the title start filling the new one. Pages without a title feed the open record.
    pub fn scan_page(&mut self, page: &PageLayout, log: &mut RunLog) -> Option<FlushedRecord> {
        let page_number = page.page_number;
        let title = self.detector.detect(&page.words);
        let attribution = attribute_tables(&page.tables, title.as_ref().map(|t| t.top));

        if self.accumulator.is_open() {
            for table in &attribution.previous {
                self.merge_table(table, page_number, log);
            }
        } else {
            log.orphaned_tables(page_number, attribution.previous.len());
        }

        let title = title?;
        log.straddling_tables(page_number, attribution.straddling.len(), title.top);

        let closed = self.accumulator.flush();
        if let Some(record) = &closed {
            log.span().in_scope(|| {
                tracing::debug!(
                    title = %record.title,
                    page = page_number,
                    "Record closed by next title"
                );
            });
        }
        if let Err(error) = self.accumulator.open(title.text.as_str(), page_number) {
            log.span().in_scope(|| {
                tracing::error!(error = %error, page = page_number, "Could not open record");
            });
            return closed;
        }
        log.span().in_scope(|| {
            tracing::info!(
                title = %title.text,
                page = page_number,
                top = title.top,
                "Record starts"
            );
        });

        for table in &attribution.current {
            self.merge_table(table, page_number, log);
        }
        closed
    }

    /// End of the page stream: flush whatever is still open.
    pub fn finish(&mut self) -> Option<FlushedRecord> {
        self.accumulator.flush()
    }

    fn merge_table(&mut self, table: &PositionedTable, page: usize, log: &mut RunLog) {
        for row in read_component_rows(table) {
            let Some(category) = normalize_label(&row.label) else {
                log.unmapped_row(page, &row.label);
                continue;
            };
            match self.accumulator.merge_row(category, &row.text) {
                MergeOutcome::Duplicate => log.duplicate_fragment(page, category),
                MergeOutcome::NoOpenRecord => log.orphaned_tables(page, 1),
                MergeOutcome::Appended | MergeOutcome::Empty => {}
            }
        }
    }
}
