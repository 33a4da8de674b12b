//! SQLite implementation of the LedgerStore trait.
//!
//! The durable ledger backend. It uses rusqlite with bundled SQLite, wrapped
//! in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use veriset_core::{Digest, ProvenanceRecord, RequestId, DIGEST_LEN};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, LedgerStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// A row as stored, before the key and digest are validated.
struct RecordRow {
    request_id: String,
    content_digest: Vec<u8>,
    source_label: String,
    artifact_ref: String,
    authenticity_tag: String,
    timestamp: i64,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            request_id: row.get("request_id")?,
            content_digest: row.get("content_digest")?,
            source_label: row.get("source_label")?,
            artifact_ref: row.get("artifact_ref")?,
            authenticity_tag: row.get("authenticity_tag")?,
            timestamp: row.get("timestamp")?,
        })
    }

    fn into_record(self) -> Result<ProvenanceRecord> {
        let request_id = RequestId::new(self.request_id)
            .map_err(|e| StoreError::InvalidData(format!("request_id: {}", e)))?;

        let digest: [u8; DIGEST_LEN] = self.content_digest.try_into().map_err(|b: Vec<u8>| {
            StoreError::InvalidData(format!(
                "content_digest: expected {} bytes, got {}",
                DIGEST_LEN,
                b.len()
            ))
        })?;

        Ok(ProvenanceRecord {
            request_id,
            content_digest: Digest::from_bytes(digest),
            source_label: self.source_label,
            artifact_ref: self.artifact_ref,
            authenticity_tag: self.authenticity_tag,
            timestamp: self.timestamp,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT request_id, content_digest, source_label, artifact_ref,
        authenticity_tag, timestamp
     FROM provenance_records";

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn put_record(&self, record: &ProvenanceRecord) -> Result<InsertResult> {
        let record = record.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let existed: bool = tx
                .query_row(
                    "SELECT 1 FROM provenance_records WHERE request_id = ?1",
                    params![record.request_id.as_str()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();

            let seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(insert_seq), 0) + 1 FROM provenance_records",
                [],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT OR REPLACE INTO provenance_records (
                    request_id, content_digest, source_label, artifact_ref,
                    authenticity_tag, timestamp, insert_seq, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.request_id.as_str(),
                    record.content_digest.as_bytes().as_slice(),
                    record.source_label,
                    record.artifact_ref,
                    record.authenticity_tag,
                    record.timestamp,
                    seq,
                    now_millis(),
                ],
            )?;

            tx.commit()?;

            debug!(request_id = %record.request_id, seq, replaced = existed, "stored record");

            Ok(if existed {
                InsertResult::Replaced
            } else {
                InsertResult::Inserted
            })
        })
        .await
    }

    async fn get_record(&self, id: &RequestId) -> Result<Option<ProvenanceRecord>> {
        let id = id.clone();

        self.blocking(move |conn| {
            let sql = format!("{} WHERE request_id = ?1", SELECT_COLUMNS);
            conn.query_row(&sql, params![id.as_str()], RecordRow::from_row)
                .optional()?
                .map(RecordRow::into_record)
                .transpose()
        })
        .await
    }

    async fn has_record(&self, id: &RequestId) -> Result<bool> {
        let id = id.clone();

        self.blocking(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM provenance_records WHERE request_id = ?1",
                    params![id.as_str()],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn list_records(&self) -> Result<Vec<ProvenanceRecord>> {
        self.blocking(|conn| {
            let sql = format!("{} ORDER BY timestamp DESC, insert_seq ASC", SELECT_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], RecordRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter().map(RecordRow::into_record).collect()
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.blocking(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM provenance_records", [], |row| {
                    row.get(0)
                })?;
            Ok(count as usize)
        })
        .await
    }
}
