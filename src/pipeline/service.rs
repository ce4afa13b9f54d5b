//! Indexing service driving one document at a time from extractor to store.

use std::path::{Path, PathBuf};

use crate::extraction::DocumentOpener;
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::store::{DocumentStatus, RecordStore, RowId};

use super::accumulator::FlushedRecord;
use super::assembly::{AssemblyContext, assemble_record};
use super::run::RunLog;
use super::scanner::PageScanner;
use super::title::TitleDetector;
use super::types::{DocumentReport, IndexOptions, IndexingError, RecordSummary};

/// Coordinates extraction, scanning and persistence for SOP documents.
///
/// The service owns the document opener, the record store and the metrics registry. Documents
/// are independent: each one gets a fresh scanner and record counter, and a failed document
/// never stops the next one in a batch.
pub struct IndexingService<S: RecordStore> {
    opener: Box<dyn DocumentOpener>,
    store: S,
    options: IndexOptions,
    metrics: IngestMetrics,
}

/// Write targets shared by every record of one document run.
struct RunTarget {
    unit_id: RowId,
    document_id: RowId,
    context: AssemblyContext,
}

impl<S: RecordStore> IndexingService<S> {
    /// Service writing to `store` with pages from `opener`.
    pub fn new(opener: Box<dyn DocumentOpener>, store: S, options: IndexOptions) -> Self {
        Self {
            opener,
            store,
            options,
            metrics: IngestMetrics::new(),
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Index every document in `paths`, continuing past failures.
    pub fn index_batch(&mut self, paths: &[PathBuf]) -> Vec<DocumentReport> {
        paths.iter().map(|path| self.index_document(path)).collect()
    }

    /// Index one document and record its terminal status.
    ///
    /// Page extraction failures skip the page. Open failures and store failures abort the
    /// document: the record still open at that point is discarded and the document entry is
    /// marked failed. Records persisted before the failure stay in the store.
    pub fn index_document(&mut self, path: &Path) -> DocumentReport {
        let mut log = RunLog::new(path);
        let span = log.span().clone();
        let _entered = span.enter();
        let mut report = DocumentReport::new(path, log.run_id().to_string());
        tracing::info!(
            start_page = self.options.window.start(),
            end_page = ?self.options.window.end(),
            replace = self.options.replace,
            "Indexing document"
        );

        let document_key = path.to_string_lossy();
        let document_id = match self.store.ensure_document(&document_key) {
            Ok(id) => id,
            Err(error) => {
                tracing::error!(error = %error, "Could not register document");
                report.error = Some(IndexingError::from(error).to_string());
                report.warnings = log.warnings();
                self.metrics.record_document(false, &report.warnings);
                return report;
            }
        };
        report.document_id = Some(document_id);

        let mut status = match self.scan_document(path, document_id, &mut log, &mut report) {
            Ok(()) => DocumentStatus::Succeeded,
            Err(error) => {
                tracing::error!(
                    error = %error,
                    records = report.records.len(),
                    "Document indexing failed"
                );
                report.error = Some(error.to_string());
                DocumentStatus::Failed
            }
        };
        if let Err(error) = self.store.set_document_status(document_id, status) {
            tracing::error!(error = %error, "Could not record document status");
            if report.error.is_none() {
                report.error = Some(error.to_string());
            }
            status = DocumentStatus::Failed;
        }

        report.status = status;
        report.warnings = log.warnings();
        self.metrics
            .record_document(report.succeeded(), &report.warnings);
        tracing::info!(
            status = %status,
            records = report.records.len(),
            pages = report.pages_scanned,
            failed_pages = report.warnings.failed_pages,
            "Document finished"
        );
        report
    }

    fn scan_document(
        &mut self,
        path: &Path,
        document_id: RowId,
        log: &mut RunLog,
        report: &mut DocumentReport,
    ) -> Result<(), IndexingError> {
        let extractor = self.opener.open(path)?;
        let unit_id = self
            .store
            .ensure_unit(&self.options.unit_name, &self.options.unit_description)?;
        if self.options.replace {
            let removed = self.store.clear_document(document_id)?;
            tracing::info!(removed, "Cleared previous records of document");
        }

        let target = RunTarget {
            unit_id,
            document_id,
            context: AssemblyContext {
                code_prefix: self.options.code_prefix.clone(),
                file_url: self.options.file_url_for(path),
            },
        };
        let pages = self.options.window.pages(extractor.page_count());
        if pages.is_empty() {
            tracing::warn!(
                page_count = extractor.page_count(),
                start_page = self.options.window.start(),
                "Page window lies beyond the document"
            );
        }

        let mut scanner = PageScanner::new(TitleDetector::new(self.options.line_tolerance));
        for page_number in pages {
            let layout = match extractor.extract_page(page_number) {
                Ok(layout) => layout,
                Err(error) => {
                    log.page_failed(page_number, &error);
                    continue;
                }
            };
            report.pages_scanned += 1;
            if let Some(record) = scanner.scan_page(&layout, log) {
                self.persist(&record, &target, report)?;
            }
        }
        if let Some(record) = scanner.finish() {
            self.persist(&record, &target, report)?;
        }
        Ok(())
    }

    fn persist(
        &mut self,
        record: &FlushedRecord,
        target: &RunTarget,
        report: &mut DocumentReport,
    ) -> Result<(), IndexingError> {
        let sequence = report.records.len() as u32 + 1;
        let batch = assemble_record(record, sequence, &target.context);
        if let Some(ordinal) = batch
            .record
            .source_ordinal
            .filter(|ordinal| *ordinal != sequence)
        {
            tracing::warn!(
                code = %batch.record.code,
                source_ordinal = ordinal,
                "Title ordinal differs from record counter"
            );
        }

        let record_id = self
            .store
            .persist_record(target.unit_id, target.document_id, &batch)?;
        self.metrics.record_flush(
            batch.components.len() as u64,
            batch.steps.len() as u64,
            batch.chunks.len() as u64,
        );
        tracing::info!(
            record_id,
            code = %batch.record.code,
            start_page = batch.record.start_page,
            components = batch.components.len(),
            steps = batch.steps.len(),
            chunks = batch.chunks.len(),
            "Record persisted"
        );
        report.records.push(RecordSummary::new(record_id, &batch));
        Ok(())
    }
}
