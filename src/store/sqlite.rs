//! SQLite-backed record store.

use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use time::OffsetDateTime;

use super::{DocumentStatus, RecordBatch, RecordStore, RowId, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS service_units (
    id          INTEGER PRIMARY KEY,
    name        TEXT UNIQUE NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS documents (
    id         INTEGER PRIMARY KEY,
    path       TEXT UNIQUE NOT NULL,
    status     TEXT CHECK(status IN ('succeeded','failed')),
    indexed_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS records (
    id               INTEGER PRIMARY KEY,
    document_id      INTEGER NOT NULL REFERENCES documents(id),
    unit_id          INTEGER NOT NULL REFERENCES service_units(id),
    code             TEXT NOT NULL,
    title            TEXT NOT NULL,
    source_ordinal   INTEGER,
    start_page       INTEGER NOT NULL,
    file_url         TEXT NOT NULL,
    service_category TEXT,
    service_audience TEXT,
    created_at       TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_records_document ON records(document_id);

CREATE TABLE IF NOT EXISTS record_components (
    id        INTEGER PRIMARY KEY,
    record_id INTEGER NOT NULL REFERENCES records(id),
    category  TEXT NOT NULL,
    label     TEXT NOT NULL,
    text      TEXT NOT NULL,
    page      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_components_record ON record_components(record_id);

CREATE TABLE IF NOT EXISTS record_steps (
    id          INTEGER PRIMARY KEY,
    record_id   INTEGER NOT NULL REFERENCES records(id),
    sequence    INTEGER NOT NULL,
    description TEXT NOT NULL,
    UNIQUE(record_id, sequence)
);

CREATE TABLE IF NOT EXISTS document_chunks (
    id          INTEGER PRIMARY KEY,
    document_id INTEGER NOT NULL REFERENCES documents(id),
    record_id   INTEGER REFERENCES records(id),
    sequence    INTEGER NOT NULL,
    text        TEXT NOT NULL,
    page        INTEGER NOT NULL,
    section     TEXT NOT NULL,
    chunk_hash  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_record ON document_chunks(record_id);
CREATE INDEX IF NOT EXISTS idx_chunks_document ON document_chunks(document_id);
";

/// [`RecordStore`] writing to a SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::with_connection(conn)
    }

    /// In-memory database, mostly for tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Codes of the records stored for `document_id`, in insertion order.
    pub fn record_codes(&self, document_id: RowId) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT code FROM records WHERE document_id = ?1 ORDER BY id")?;
        let codes = stmt
            .query_map(params![document_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(codes)
    }

    /// `(sequence, section)` of every chunk of `record_id`, ordered by sequence.
    pub fn chunk_sections(&self, record_id: RowId) -> Result<Vec<(u32, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT sequence, section FROM document_chunks WHERE record_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt
            .query_map(params![record_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(u32, String)>, _>>()?;
        Ok(rows)
    }

    /// Step descriptions of `record_id`, ordered by sequence.
    pub fn step_descriptions(&self, record_id: RowId) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT description FROM record_steps WHERE record_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt
            .query_map(params![record_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Stored status of a document entry.
    pub fn document_status(&self, document_id: RowId) -> Result<Option<String>, StoreError> {
        let status = self
            .conn
            .query_row(
                "SELECT status FROM documents WHERE id = ?1",
                params![document_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        status.ok_or(StoreError::UnknownRow {
            kind: "document",
            id: document_id,
        })
    }

    /// Number of rows in one of the store's tables.
    pub fn row_count(&self, table: &str) -> Result<u64, StoreError> {
        const TABLES: [&str; 6] = [
            "service_units",
            "documents",
            "records",
            "record_components",
            "record_steps",
            "document_chunks",
        ];
        if !TABLES.contains(&table) {
            return Err(StoreError::Rejected(format!("unknown table {table}")));
        }
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

impl RecordStore for SqliteStore {
    fn ensure_unit(&mut self, name: &str, description: &str) -> Result<RowId, StoreError> {
        let existing = self
            .conn
            .query_row(
                "SELECT id FROM service_units WHERE name = ?1",
                params![name],
                |row| row.get::<_, RowId>(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO service_units (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn ensure_document(&mut self, path: &str) -> Result<RowId, StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO documents (path) VALUES (?1)",
            params![path],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM documents WHERE path = ?1",
            params![path],
            |row| row.get::<_, RowId>(0),
        )?;
        Ok(id)
    }

    fn clear_document(&mut self, document_id: RowId) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM document_chunks WHERE document_id = ?1",
            params![document_id],
        )?;
        tx.execute(
            "DELETE FROM record_steps WHERE record_id IN
                (SELECT id FROM records WHERE document_id = ?1)",
            params![document_id],
        )?;
        tx.execute(
            "DELETE FROM record_components WHERE record_id IN
                (SELECT id FROM records WHERE document_id = ?1)",
            params![document_id],
        )?;
        let removed = tx.execute(
            "DELETE FROM records WHERE document_id = ?1",
            params![document_id],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    fn persist_record(
        &mut self,
        unit_id: RowId,
        document_id: RowId,
        batch: &RecordBatch,
    ) -> Result<RowId, StoreError> {
        let tx = self.conn.transaction()?;
        let record = &batch.record;
        tx.execute(
            "INSERT INTO records
                (document_id, unit_id, code, title, source_ordinal, start_page, file_url,
                 service_category, service_audience)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                document_id,
                unit_id,
                record.code,
                record.title,
                record.source_ordinal,
                record.start_page,
                record.file_url,
                record.service_category,
                record.service_audience,
            ],
        )?;
        let record_id = tx.last_insert_rowid();

        for component in &batch.components {
            tx.execute(
                "INSERT INTO record_components (record_id, category, label, text, page)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record_id,
                    component.category.as_str(),
                    component.label,
                    component.text,
                    component.page,
                ],
            )?;
        }

        for step in &batch.steps {
            tx.execute(
                "INSERT INTO record_steps (record_id, sequence, description)
                 VALUES (?1, ?2, ?3)",
                params![record_id, step.sequence, step.description],
            )?;
        }

        for chunk in &batch.chunks {
            tx.execute(
                "INSERT INTO document_chunks
                    (document_id, record_id, sequence, text, page, section, chunk_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    document_id,
                    record_id,
                    chunk.sequence,
                    chunk.text,
                    chunk.page,
                    chunk.section,
                    chunk.chunk_hash,
                ],
            )?;
        }

        tx.commit()?;
        Ok(record_id)
    }

    fn set_document_status(
        &mut self,
        document_id: RowId,
        status: DocumentStatus,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE documents SET status = ?1, indexed_at = ?2 WHERE id = ?3",
            params![status.as_str(), current_timestamp_rfc3339(), document_id],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownRow {
                kind: "document",
                id: document_id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Category;
    use crate::store::{ChunkEntry, ComponentEntry, RecordEntry, StepEntry};

    fn batch() -> RecordBatch {
        RecordBatch {
            record: RecordEntry {
                code: "SOP-ULT-001".into(),
                title: "Standar Pelayanan Legalisir".into(),
                source_ordinal: Some(1),
                start_page: 9,
                file_url: "storage/dokumen/sop/sop.pdf".into(),
                service_category: None,
                service_audience: None,
            },
            components: vec![ComponentEntry {
                category: Category::Procedure,
                label: Category::Procedure.label().into(),
                text: "a. Isi formulir b. Serahkan".into(),
                page: 9,
            }],
            steps: vec![
                StepEntry {
                    sequence: 1,
                    description: "Isi formulir".into(),
                },
                StepEntry {
                    sequence: 2,
                    description: "Serahkan".into(),
                },
            ],
            chunks: vec![
                ChunkEntry {
                    sequence: 1,
                    text: "x".into(),
                    page: 9,
                    section: "procedure".into(),
                    chunk_hash: "h1".into(),
                },
                ChunkEntry {
                    sequence: 2,
                    text: "y".into(),
                    page: 9,
                    section: "step 1".into(),
                    chunk_hash: "h2".into(),
                },
            ],
        }
    }

    #[test]
    fn persists_batch_and_reads_back() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let unit = store.ensure_unit("Unit Layanan Terpadu", "ULT").unwrap();
        assert_eq!(
            store.ensure_unit("Unit Layanan Terpadu", "ULT").unwrap(),
            unit
        );
        let doc = store.ensure_document("sop.pdf").unwrap();
        assert_eq!(store.ensure_document("sop.pdf").unwrap(), doc);

        let record_id = store.persist_record(unit, doc, &batch()).unwrap();
        assert_eq!(store.record_codes(doc).unwrap(), vec!["SOP-ULT-001"]);
        assert_eq!(
            store.chunk_sections(record_id).unwrap(),
            vec![(1, "procedure".to_string()), (2, "step 1".to_string())]
        );
        assert_eq!(
            store.step_descriptions(record_id).unwrap(),
            vec!["Isi formulir", "Serahkan"]
        );
        assert_eq!(store.row_count("record_components").unwrap(), 1);
    }

    #[test]
    fn failed_batch_leaves_no_partial_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let unit = store.ensure_unit("ULT", "").unwrap();
        let doc = store.ensure_document("sop.pdf").unwrap();
        let mut bad = batch();
        bad.steps.push(StepEntry {
            sequence: 1,
            description: "duplicate sequence".into(),
        });
        assert!(store.persist_record(unit, doc, &bad).is_err());
        assert_eq!(store.row_count("records").unwrap(), 0);
        assert_eq!(store.row_count("record_steps").unwrap(), 0);
    }

    #[test]
    fn clear_document_and_status() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let unit = store.ensure_unit("ULT", "").unwrap();
        let doc = store.ensure_document("sop.pdf").unwrap();
        store.persist_record(unit, doc, &batch()).unwrap();
        store.persist_record(unit, doc, &batch()).unwrap();
        assert_eq!(store.clear_document(doc).unwrap(), 2);
        assert_eq!(store.row_count("document_chunks").unwrap(), 0);
        assert_eq!(store.row_count("record_steps").unwrap(), 0);

        assert_eq!(store.document_status(doc).unwrap(), None);
        store
            .set_document_status(doc, DocumentStatus::Succeeded)
            .unwrap();
        assert_eq!(
            store.document_status(doc).unwrap().as_deref(),
            Some("succeeded")
        );
        let unknown = store.set_document_status(999, DocumentStatus::Failed);
        assert!(unknown.is_err());
        assert!(store.row_count("sqlite_master").is_err());
    }
}
