//! In-memory record store used for dry runs and tests.

use serde::Serialize;

use super::{DocumentStatus, RecordBatch, RecordStore, RowId, StoreError};

/// Document entry held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    /// Row id.
    pub id: RowId,
    /// Document path as registered.
    pub path: String,
    /// Terminal status, once set.
    pub status: Option<DocumentStatus>,
}

/// Record held by [`MemoryStore`] together with its dependent rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    /// Row id.
    pub id: RowId,
    /// Owning unit.
    pub unit_id: RowId,
    /// Owning document.
    pub document_id: RowId,
    /// Persisted rows.
    pub batch: RecordBatch,
}

/// Vector-backed [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    units: Vec<(RowId, String)>,
    documents: Vec<StoredDocument>,
    records: Vec<StoredRecord>,
    next_id: RowId,
    persist_limit: Option<usize>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects every `persist_record` call after `limit` successful ones.
    pub fn with_persist_limit(limit: usize) -> Self {
        Self {
            persist_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Records persisted so far, in write order.
    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    /// Registered documents.
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    /// Document entry by id.
    pub fn document(&self, id: RowId) -> Option<&StoredDocument> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Registered unit names.
    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|(_, name)| name.as_str()).collect()
    }

    fn allocate_id(&mut self) -> RowId {
        self.next_id += 1;
        self.next_id
    }
}

impl RecordStore for MemoryStore {
    fn ensure_unit(&mut self, name: &str, _description: &str) -> Result<RowId, StoreError> {
        if let Some((id, _)) = self.units.iter().find(|(_, existing)| existing == name) {
            return Ok(*id);
        }
        let id = self.allocate_id();
        self.units.push((id, name.to_string()));
        Ok(id)
    }

    fn ensure_document(&mut self, path: &str) -> Result<RowId, StoreError> {
        if let Some(doc) = self.documents.iter().find(|doc| doc.path == path) {
            return Ok(doc.id);
        }
        let id = self.allocate_id();
        self.documents.push(StoredDocument {
            id,
            path: path.to_string(),
            status: None,
        });
        Ok(id)
    }

    fn clear_document(&mut self, document_id: RowId) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records
            .retain(|record| record.document_id != document_id);
        Ok(before - self.records.len())
    }

    fn persist_record(
        &mut self,
        unit_id: RowId,
        document_id: RowId,
        batch: &RecordBatch,
    ) -> Result<RowId, StoreError> {
        if self
            .persist_limit
            .is_some_and(|limit| self.records.len() >= limit)
        {
            return Err(StoreError::Rejected(format!(
                "persist limit reached before {}",
                batch.record.code
            )));
        }
        if self.document(document_id).is_none() {
            return Err(StoreError::UnknownRow {
                kind: "document",
                id: document_id,
            });
        }
        let id = self.allocate_id();
        self.records.push(StoredRecord {
            id,
            unit_id,
            document_id,
            batch: batch.clone(),
        });
        Ok(id)
    }

    fn set_document_status(
        &mut self,
        document_id: RowId,
        status: DocumentStatus,
    ) -> Result<(), StoreError> {
        let doc = self
            .documents
            .iter_mut()
            .find(|doc| doc.id == document_id)
            .ok_or(StoreError::UnknownRow {
                kind: "document",
                id: document_id,
            })?;
        doc.status = Some(status);
        Ok(())
    }
}
