//! Options, reports and errors of the document indexing pipeline.

use serde::Serialize;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

use crate::config::Config;
use crate::extraction::ExtractionError;
use crate::store::{DocumentStatus, RecordBatch, RowId, StoreError};

use super::run::WarningCounts;
use super::title::DEFAULT_LINE_TOLERANCE;

/// Errors that abort a whole document.
#[derive(Debug, Error)]
pub enum IndexingError {
    /// The requested page window is empty or starts before page 1.
    #[error("invalid page window {start}..={end:?}")]
    InvalidWindow {
        /// Requested first page.
        start: usize,
        /// Requested last page.
        end: Option<usize>,
    },
    /// The document could not be opened.
    #[error("Failed to open document: {0}")]
    Extraction(#[from] ExtractionError),
    /// The record store rejected a write.
    #[error("Record store failed: {0}")]
    Store(#[from] StoreError),
}

/// Inclusive, 1-based range of pages to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    start: usize,
    end: Option<usize>,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            start: 1,
            end: None,
        }
    }
}

impl PageWindow {
    /// Window from `start` to `end` (or the last page when `None`).
    pub fn new(start: usize, end: Option<usize>) -> Result<Self, IndexingError> {
        if start == 0 || end.is_some_and(|end| end < start) {
            return Err(IndexingError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// First page of the window.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last page of the window, if bounded.
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Pages to visit for a document of `page_count` pages.
    pub fn pages(&self, page_count: usize) -> RangeInclusive<usize> {
        let end = self.end.map_or(page_count, |end| end.min(page_count));
        self.start..=end
    }
}

/// Per-run settings of the indexing service.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Pages to scan.
    pub window: PageWindow,
    /// Record code prefix.
    pub code_prefix: String,
    /// Owning unit name.
    pub unit_name: String,
    /// Owning unit description, used when the unit is created.
    pub unit_description: String,
    /// Title line grouping tolerance.
    pub line_tolerance: f64,
    /// Prefix of each record's `file_url`.
    pub file_url_prefix: String,
    /// Remove the document's previous records before scanning.
    pub replace: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            window: PageWindow::default(),
            code_prefix: "SOP-ULT".into(),
            unit_name: "Unit Layanan Terpadu".into(),
            unit_description: String::new(),
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            file_url_prefix: "storage/dokumen/sop".into(),
            replace: false,
        }
    }
}

impl IndexOptions {
    /// Options derived from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, IndexingError> {
        Ok(Self {
            window: PageWindow::new(config.start_page, config.end_page)?,
            code_prefix: config.code_prefix.clone(),
            unit_name: config.unit_name.clone(),
            unit_description: config.unit_description.clone(),
            line_tolerance: config.line_tolerance,
            file_url_prefix: config.file_url_prefix.clone(),
            replace: false,
        })
    }

    /// `file_url` stored for records of `path`.
    pub fn file_url_for(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = self.file_url_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        }
    }
}

/// Short description of one persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    /// Store id.
    pub record_id: RowId,
    /// Generated code.
    pub code: String,
    /// Stored title.
    pub title: String,
    /// Start page.
    pub start_page: usize,
    /// Number of components.
    pub components: usize,
    /// Number of steps.
    pub steps: usize,
    /// Number of chunks.
    pub chunks: usize,
}

impl RecordSummary {
    pub(crate) fn new(record_id: RowId, batch: &RecordBatch) -> Self {
        Self {
            record_id,
            code: batch.record.code.clone(),
            title: batch.record.title.clone(),
            start_page: batch.record.start_page,
            components: batch.components.len(),
            steps: batch.steps.len(),
            chunks: batch.chunks.len(),
        }
    }
}

/// Outcome of indexing one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    /// Run identifier shared by every log line of the run.
    pub run_id: String,
    /// Document path.
    pub document: String,
    /// Store id of the document entry, when one could be registered.
    pub document_id: Option<RowId>,
    /// Terminal status.
    pub status: DocumentStatus,
    /// Pages extracted successfully.
    pub pages_scanned: usize,
    /// Records persisted, in flush order.
    pub records: Vec<RecordSummary>,
    /// Recoverable problems met during the scan.
    pub warnings: WarningCounts,
    /// Cause of failure, for failed documents.
    pub error: Option<String>,
}

impl DocumentReport {
    pub(crate) fn new(document: &Path, run_id: String) -> Self {
        Self {
            run_id,
            document: document.display().to_string(),
            document_id: None,
            status: DocumentStatus::Failed,
            pages_scanned: 0,
            records: Vec::new(),
            warnings: WarningCounts::default(),
            error: None,
        }
    }

    /// Whether the document was indexed completely.
    pub fn succeeded(&self) -> bool {
        self.status == DocumentStatus::Succeeded
    }
}
