//! LedgerStore trait: the abstract interface for provenance record storage.
//!
//! This trait keeps the ledger storage-agnostic. Implementations include
//! in-memory (the default, ephemeral) and SQLite (opt-in, durable).

use std::sync::Arc;

use async_trait::async_trait;
use veriset_core::{ProvenanceRecord, RequestId};

use crate::error::Result;

/// Result of writing a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// No record existed under this request identifier.
    Inserted,
    /// A previous record under the same identifier was overwritten.
    Replaced,
}

/// The LedgerStore trait: async interface for provenance records.
///
/// # Design Notes
///
/// - **Last write wins**: `put_record` on an existing key replaces the whole
///   record. There is no merge and no uniqueness check beyond the key.
/// - **Per-key atomicity**: a reader sees either the complete old record or
///   the complete new one, never a mix.
/// - **Ordering**: `list_records` returns newest `timestamp` first. Records
///   with equal timestamps come back in the order they were written.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert or replace the record keyed by `record.request_id`.
    async fn put_record(&self, record: &ProvenanceRecord) -> Result<InsertResult>;

    /// Get a record by request identifier.
    async fn get_record(&self, id: &RequestId) -> Result<Option<ProvenanceRecord>>;

    /// Check whether a record exists.
    async fn has_record(&self, id: &RequestId) -> Result<bool>;

    /// All records, newest first.
    async fn list_records(&self) -> Result<Vec<ProvenanceRecord>>;

    /// Number of records.
    async fn count(&self) -> Result<usize>;
}

#[async_trait]
impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    async fn put_record(&self, record: &ProvenanceRecord) -> Result<InsertResult> {
        (**self).put_record(record).await
    }

    async fn get_record(&self, id: &RequestId) -> Result<Option<ProvenanceRecord>> {
        (**self).get_record(id).await
    }

    async fn has_record(&self, id: &RequestId) -> Result<bool> {
        (**self).has_record(id).await
    }

    async fn list_records(&self) -> Result<Vec<ProvenanceRecord>> {
        (**self).list_records().await
    }

    async fn count(&self) -> Result<usize> {
        (**self).count().await
    }
}

#[async_trait]
impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    async fn put_record(&self, record: &ProvenanceRecord) -> Result<InsertResult> {
        (**self).put_record(record).await
    }

    async fn get_record(&self, id: &RequestId) -> Result<Option<ProvenanceRecord>> {
        (**self).get_record(id).await
    }

    async fn has_record(&self, id: &RequestId) -> Result<bool> {
        (**self).has_record(id).await
    }

    async fn list_records(&self) -> Result<Vec<ProvenanceRecord>> {
        (**self).list_records().await
    }

    async fn count(&self) -> Result<usize> {
        (**self).count().await
    }
}
