//! Provenance records: what the ledger stores per processing event.
//!
//! A record binds a content digest to a request identifier returned by the
//! processing service. Records are immutable once built. Replacing one means
//! registering a new record under the same key.

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::types::RequestId;

/// A single provenance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Ledger key.
    pub request_id: RequestId,
    /// Merkle root (or direct hash) of the source the artifact was produced from.
    pub content_digest: Digest,
    /// Filename or path string of the source, as supplied at registration.
    pub source_label: String,
    /// Reference to the produced artifact (model, weights, output blob).
    pub artifact_ref: String,
    /// Opaque authenticity tag, typically the processor's signature.
    pub authenticity_tag: String,
    /// Creation time, Unix milliseconds.
    pub timestamp: i64,
}

impl ProvenanceRecord {
    /// Start building a record.
    pub fn builder(request_id: RequestId, content_digest: Digest) -> RecordBuilder {
        RecordBuilder::new(request_id, content_digest)
    }

    /// Project this record into a history entry.
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry::from(self)
    }
}

/// Builder for provenance records.
pub struct RecordBuilder {
    request_id: RequestId,
    content_digest: Digest,
    source_label: String,
    artifact_ref: String,
    authenticity_tag: String,
    timestamp: i64,
}

impl RecordBuilder {
    pub fn new(request_id: RequestId, content_digest: Digest) -> Self {
        Self {
            request_id,
            content_digest,
            source_label: String::new(),
            artifact_ref: String::new(),
            authenticity_tag: String::new(),
            timestamp: 0,
        }
    }

    /// Set the source label.
    pub fn source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    /// Set the produced-artifact reference.
    pub fn artifact_ref(mut self, artifact: impl Into<String>) -> Self {
        self.artifact_ref = artifact.into();
        self
    }

    /// Set the authenticity tag.
    pub fn authenticity_tag(mut self, tag: impl Into<String>) -> Self {
        self.authenticity_tag = tag.into();
        self
    }

    /// Set the creation timestamp (Unix ms).
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn build(self) -> ProvenanceRecord {
        ProvenanceRecord {
            request_id: self.request_id,
            content_digest: self.content_digest,
            source_label: self.source_label,
            artifact_ref: self.artifact_ref,
            authenticity_tag: self.authenticity_tag,
            timestamp: self.timestamp,
        }
    }
}

/// The history view of a record, without the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub request_id: RequestId,
    pub source_label: String,
    pub artifact_ref: String,
    pub authenticity_tag: String,
    pub timestamp: i64,
}

impl From<&ProvenanceRecord> for HistoryEntry {
    fn from(record: &ProvenanceRecord) -> Self {
        Self {
            request_id: record.request_id.clone(),
            source_label: record.source_label.clone(),
            artifact_ref: record.artifact_ref.clone(),
            authenticity_tag: record.authenticity_tag.clone(),
            timestamp: record.timestamp,
        }
    }
}
