//! In-memory implementation of the LedgerStore trait.
//!
//! This is the default ledger backend. Records live as long as the store and
//! are gone on restart.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use veriset_core::{ProvenanceRecord, RequestId};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, LedgerStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; each
/// write replaces a whole record under the write lock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Records indexed by request identifier.
    records: HashMap<RequestId, StoredRecord>,

    /// Write counter, used to break timestamp ties in listing order.
    next_seq: u64,
}

struct StoredRecord {
    record: ProvenanceRecord,
    seq: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                records: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn put_record(&self, record: &ProvenanceRecord) -> Result<InsertResult> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let previous = inner.records.insert(
            record.request_id.clone(),
            StoredRecord {
                record: record.clone(),
                seq,
            },
        );

        debug!(
            request_id = %record.request_id,
            seq,
            replaced = previous.is_some(),
            "stored record"
        );

        Ok(match previous {
            Some(_) => InsertResult::Replaced,
            None => InsertResult::Inserted,
        })
    }

    async fn get_record(&self, id: &RequestId) -> Result<Option<ProvenanceRecord>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.records.get(id).map(|stored| stored.record.clone()))
    }

    async fn has_record(&self, id: &RequestId) -> Result<bool> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.records.contains_key(id))
    }

    async fn list_records(&self) -> Result<Vec<ProvenanceRecord>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;

        let mut stored: Vec<&StoredRecord> = inner.records.values().collect();
        stored.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then(a.seq.cmp(&b.seq))
        });

        Ok(stored.into_iter().map(|s| s.record.clone()).collect())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veriset_core::digest;

    fn make_record(id: &str, data: &[u8], ts: i64) -> ProvenanceRecord {
        ProvenanceRecord::builder(RequestId::new(id).unwrap(), digest(data))
            .source_label(format!("{}.csv", id))
            .artifact_ref("model")
            .authenticity_tag("sig")
            .timestamp(ts)
            .build()
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let record = make_record("r1", b"a", 1000);

        let result = store.put_record(&record).await.unwrap();
        assert_eq!(result, InsertResult::Inserted);

        let retrieved = store.get_record(&record.request_id).await.unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert!(store.has_record(&record.request_id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryStore::new();
        store.put_record(&make_record("r1", b"a", 1000)).await.unwrap();

        let newer = make_record("r1", b"b", 2000);
        let result = store.put_record(&newer).await.unwrap();
        assert_eq!(result, InsertResult::Replaced);

        let retrieved = store.get_record(&newer.request_id).await.unwrap().unwrap();
        assert_eq!(retrieved.content_digest, digest(b"b"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_stable_ties() {
        let store = MemoryStore::new();
        store.put_record(&make_record("old", b"1", 100)).await.unwrap();
        store.put_record(&make_record("tie-a", b"2", 200)).await.unwrap();
        store.put_record(&make_record("tie-b", b"3", 200)).await.unwrap();
        store.put_record(&make_record("new", b"4", 300)).await.unwrap();

        let ids: Vec<String> = store
            .list_records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.request_id.to_string())
            .collect();

        assert_eq!(ids, vec!["new", "tie-a", "tie-b", "old"]);
    }

    #[tokio::test]
    async fn test_concurrent_distinct_keys() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let record = make_record(&format!("r{}", i), &[i as u8], i as i64);
                store.put_record(&record).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 32);
    }
}
