//! Record store contract and its implementations.
//!
//! The pipeline writes through [`RecordStore`] only when a record is flushed, one
//! [`RecordBatch`] at a time. Implementations persist a batch atomically: the record row, its
//! components, its steps and its chunks land together or not at all.

mod memory;
mod sqlite;

pub use memory::{MemoryStore, StoredDocument, StoredRecord};
pub use sqlite::SqliteStore;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::pipeline::Category;

/// Primary key assigned by a store.
pub type RowId = i64;

/// Errors raised by record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected a statement.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A referenced row does not exist.
    #[error("unknown {kind} id {id}")]
    UnknownRow {
        /// Table the id was looked up in.
        kind: &'static str,
        /// Missing id.
        id: RowId,
    },
    /// The store refused the write.
    #[error("store rejected write: {0}")]
    Rejected(String),
}

/// Terminal indexing status of a document entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// The whole scan completed.
    Succeeded,
    /// The scan aborted; see logs for the cause.
    Failed,
}

impl DocumentStatus {
    /// Value stored in the status column.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Succeeded => "succeeded",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordEntry {
    /// Generated code, `<prefix>-NNN`.
    pub code: String,
    /// Title with its leading ordinal stripped.
    pub title: String,
    /// Ordinal printed in front of the title, when there was one.
    pub source_ordinal: Option<u32>,
    /// Page on which the record starts.
    pub start_page: usize,
    /// Location of the source document as exposed to readers.
    pub file_url: String,
    /// Service category, filled by later enrichment.
    pub service_category: Option<String>,
    /// Service audience, filled by later enrichment.
    pub service_audience: Option<String>,
}

/// Component row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentEntry {
    /// Canonical category.
    pub category: Category,
    /// Canonical label of the category.
    pub label: String,
    /// Whitespace-normalized accumulated text.
    pub text: String,
    /// Page the component is attributed to.
    pub page: usize,
}

/// Step row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEntry {
    /// 1-based position within the record.
    pub sequence: u32,
    /// Whitespace-normalized description.
    pub description: String,
}

/// Chunk row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkEntry {
    /// Record-scoped sequence number (`no_urut`), contiguous from 1.
    pub sequence: u32,
    /// Indexable text.
    pub text: String,
    /// Page the text was sourced from.
    pub page: usize,
    /// Category name or `step N`.
    pub section: String,
    /// SHA-256 hex digest of `text`.
    pub chunk_hash: String,
}

/// Everything persisted for one flushed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordBatch {
    /// The record itself.
    pub record: RecordEntry,
    /// Components in category declaration order.
    pub components: Vec<ComponentEntry>,
    /// Steps in enumeration order.
    pub steps: Vec<StepEntry>,
    /// Components' chunks followed by steps' chunks.
    pub chunks: Vec<ChunkEntry>,
}

/// Destination of flushed records.
pub trait RecordStore {
    /// Return the id of the service unit called `name`, creating it when absent.
    fn ensure_unit(&mut self, name: &str, description: &str) -> Result<RowId, StoreError>;

    /// Return the id of the document entry for `path`, creating it when absent.
    fn ensure_document(&mut self, path: &str) -> Result<RowId, StoreError>;

    /// Delete every record (and dependent row) previously written for `document_id`.
    ///
    /// Returns the number of records removed.
    fn clear_document(&mut self, document_id: RowId) -> Result<usize, StoreError>;

    /// Persist one record batch atomically and return the record's id.
    fn persist_record(
        &mut self,
        unit_id: RowId,
        document_id: RowId,
        batch: &RecordBatch,
    ) -> Result<RowId, StoreError>;

    /// Set the terminal status of a document entry.
    fn set_document_status(
        &mut self,
        document_id: RowId,
        status: DocumentStatus,
    ) -> Result<(), StoreError>;
}
