//! Per-document run context handed to every stage that can warn.

use std::path::Path;
use tracing::Span;
use uuid::Uuid;

use super::taxonomy::Category;

/// Recoverable problems counted during one document run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningCounts {
    /// Pages whose extraction failed.
    pub failed_pages: u64,
    /// Rows whose label matched no category.
    pub unmapped_rows: u64,
    /// Tables with no open record to receive them.
    pub orphaned_tables: u64,
    /// Tables crossing a title line.
    pub straddling_tables: u64,
    /// Row fragments already present in their category text.
    pub duplicate_fragments: u64,
}

/// Logging scope of a single document run.
///
/// Stages receive `&mut RunLog` instead of logging through ambient state, so every warning is
/// tagged with the run id and counted against the document it came from.
#[derive(Debug)]
pub struct RunLog {
    run_id: Uuid,
    span: Span,
    warnings: WarningCounts,
}

impl RunLog {
    /// Open a run scope for `document`.
    pub fn new(document: &Path) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "document_run",
            run_id = %run_id,
            document = %document.display()
        );
        Self {
            run_id,
            span,
            warnings: WarningCounts::default(),
        }
    }

    /// Identifier of this run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Span every event of this run is recorded under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Warning counters so far.
    pub fn warnings(&self) -> WarningCounts {
        self.warnings
    }

    pub(crate) fn page_failed(&mut self, page: usize, error: &dyn std::error::Error) {
        self.warnings.failed_pages += 1;
        self.span.in_scope(|| {
            tracing::warn!(page, error = %error, "Page extraction failed; skipping page");
        });
    }

    pub(crate) fn unmapped_row(&mut self, page: usize, label: &str) {
        self.warnings.unmapped_rows += 1;
        self.span.in_scope(|| {
            tracing::debug!(page, label, "Dropping row with unmapped component label");
        });
    }

    pub(crate) fn orphaned_tables(&mut self, page: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.warnings.orphaned_tables += count as u64;
        self.span.in_scope(|| {
            tracing::warn!(page, tables = count, "No open record; dropping tables");
        });
    }

    pub(crate) fn straddling_tables(&mut self, page: usize, count: usize, title_top: f64) {
        if count == 0 {
            return;
        }
        self.warnings.straddling_tables += count as u64;
        self.span.in_scope(|| {
            tracing::warn!(
                page,
                tables = count,
                title_top,
                "Tables cross the title line; dropping them"
            );
        });
    }

    pub(crate) fn duplicate_fragment(&mut self, page: usize, category: Category) {
        self.warnings.duplicate_fragments += 1;
        self.span.in_scope(|| {
            tracing::trace!(page, %category, "Skipping fragment already merged");
        });
    }
}
