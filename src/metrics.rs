use std::sync::atomic::{AtomicU64, Ordering};

use crate::pipeline::WarningCounts;

/// Thread-safe counters describing ingestion activity across documents.
#[derive(Default)]
pub struct IngestMetrics {
    documents_indexed: AtomicU64,
    documents_failed: AtomicU64,
    records_flushed: AtomicU64,
    components_written: AtomicU64,
    steps_written: AtomicU64,
    chunks_written: AtomicU64,
    pages_failed: AtomicU64,
    unmapped_rows: AtomicU64,
    orphaned_tables: AtomicU64,
    straddling_tables: AtomicU64,
    duplicate_fragments: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one persisted record and the rows written alongside it.
    pub fn record_flush(&self, components: u64, steps: u64, chunks: u64) {
        self.records_flushed.fetch_add(1, Ordering::Relaxed);
        self.components_written
            .fetch_add(components, Ordering::Relaxed);
        self.steps_written.fetch_add(steps, Ordering::Relaxed);
        self.chunks_written.fetch_add(chunks, Ordering::Relaxed);
    }

    /// Record the end of a document run and fold in its warning counters.
    pub fn record_document(&self, succeeded: bool, warnings: &WarningCounts) {
        if succeeded {
            self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.documents_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.pages_failed
            .fetch_add(warnings.failed_pages, Ordering::Relaxed);
        self.unmapped_rows
            .fetch_add(warnings.unmapped_rows, Ordering::Relaxed);
        self.orphaned_tables
            .fetch_add(warnings.orphaned_tables, Ordering::Relaxed);
        self.straddling_tables
            .fetch_add(warnings.straddling_tables, Ordering::Relaxed);
        self.duplicate_fragments
            .fetch_add(warnings.duplicate_fragments, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            components_written: self.components_written.load(Ordering::Relaxed),
            steps_written: self.steps_written.load(Ordering::Relaxed),
            chunks_written: self.chunks_written.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            unmapped_rows: self.unmapped_rows.load(Ordering::Relaxed),
            orphaned_tables: self.orphaned_tables.load(Ordering::Relaxed),
            straddling_tables: self.straddling_tables.load(Ordering::Relaxed),
            duplicate_fragments: self.duplicate_fragments.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Documents whose scan completed and were marked succeeded.
    pub documents_indexed: u64,
    /// Documents marked failed.
    pub documents_failed: u64,
    /// Records flushed and persisted.
    pub records_flushed: u64,
    /// Component rows written.
    pub components_written: u64,
    /// Step rows written.
    pub steps_written: u64,
    /// Chunk rows written.
    pub chunks_written: u64,
    /// Pages whose extraction failed and contributed nothing.
    pub pages_failed: u64,
    /// Table rows dropped because their label matched no category.
    pub unmapped_rows: u64,
    /// Tables dropped because no record was open to receive them.
    pub orphaned_tables: u64,
    /// Tables dropped because they crossed a title line.
    pub straddling_tables: u64,
    /// Row fragments skipped because the category text already contained them.
    pub duplicate_fragments: u64,
}
