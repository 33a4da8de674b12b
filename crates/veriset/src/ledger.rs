//! The provenance ledger: binds content digests to training events.
//!
//! The ledger owns a [`LedgerStore`] and a digest cache. Its whole surface is
//! `register`, `verify`, `list` and `get`; there is no ambient global state.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use veriset_core::{
    digest, hash_reader, CoreError, Digest, MerkleTree, ProvenanceRecord, RequestId, Source,
};
use veriset_store::{InsertResult, LedgerStore};

use crate::config::RegistryConfig;
use crate::error::{KernelError, Result};

/// How a content digest was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestOrigin {
    /// Merkle root of the source bytes.
    Content,
    /// Hash of the path text, because the file could not be opened.
    PathText,
}

/// A content digest together with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDigest {
    pub digest: Digest,
    pub origin: DigestOrigin,
}

/// Verification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Content digest matches.
    Valid,
    /// The candidate could not be read; its path text hashed to the stored digest.
    PathFallbackMatch,
    /// Same source label, different content.
    PathMatchContentMismatch,
    /// Neither content nor label match.
    Mismatch,
    /// No record under the request identifier.
    NotFound,
}

impl VerificationStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid | Self::PathFallbackMatch)
    }
}

/// What was compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetails {
    /// Label stored with the record, if one was found.
    pub expected_source: Option<String>,
    pub provided_source: String,
    pub hash_match: bool,
    pub path_match: bool,
    /// Origin of the candidate digest; absent when no record was found.
    pub digest_origin: Option<DigestOrigin>,
}

/// Structured result of `verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub valid: bool,
    pub message: String,
    pub warning: Option<String>,
    pub details: VerificationDetails,
}

impl VerificationOutcome {
    fn new(
        status: VerificationStatus,
        message: impl Into<String>,
        details: VerificationDetails,
    ) -> Self {
        Self {
            status,
            valid: status.is_valid(),
            message: message.into(),
            warning: None,
            details,
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Provenance ledger over a store.
pub struct ProvenanceLedger<S: LedgerStore> {
    store: S,
    cache: RwLock<HashMap<PathBuf, Digest>>,
    config: RegistryConfig,
}

impl<S: LedgerStore> ProvenanceLedger<S> {
    /// Create a ledger. Fails if the configuration is invalid.
    pub fn new(store: S, config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            cache: RwLock::new(HashMap::new()),
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Store a record, replacing any previous record under the same key.
    pub async fn register(&self, record: ProvenanceRecord) -> Result<InsertResult> {
        let result = self.store.put_record(&record).await?;
        info!(
            request_id = %record.request_id,
            digest = %record.content_digest,
            replaced = matches!(result, InsertResult::Replaced),
            "registered provenance record"
        );
        Ok(result)
    }

    /// Check a candidate source against the record under `request_id`.
    ///
    /// A missing record is a `NotFound` outcome, not an error. Errors are
    /// reserved for failures to hash the candidate, such as an empty file.
    pub async fn verify(
        &self,
        request_id: &str,
        candidate: &Source,
    ) -> Result<VerificationOutcome> {
        let provided_source = candidate.label();

        let record = match RequestId::new(request_id) {
            Ok(id) => self.store.get_record(&id).await?,
            Err(_) => None,
        };

        let Some(record) = record else {
            debug!(request_id, "verify: no record");
            return Ok(VerificationOutcome::new(
                VerificationStatus::NotFound,
                "no training record found for this model",
                VerificationDetails {
                    expected_source: None,
                    provided_source,
                    hash_match: false,
                    path_match: false,
                    digest_origin: None,
                },
            ));
        };

        let resolved = self.content_digest(candidate).await?;
        let hash_match = resolved.digest == record.content_digest;
        let path_match = provided_source == record.source_label;

        let details = VerificationDetails {
            expected_source: Some(record.source_label.clone()),
            provided_source,
            hash_match,
            path_match,
            digest_origin: Some(resolved.origin),
        };

        let outcome = match (hash_match, resolved.origin, path_match) {
            (true, DigestOrigin::Content, _) => VerificationOutcome::new(
                VerificationStatus::Valid,
                "dataset verified: content matches the training record",
                details,
            ),
            (true, DigestOrigin::PathText, _) => VerificationOutcome::new(
                VerificationStatus::PathFallbackMatch,
                "dataset matched by path only",
                details,
            )
            .with_warning("source could not be read; only the path text was compared"),
            (false, _, true) => VerificationOutcome::new(
                VerificationStatus::PathMatchContentMismatch,
                "dataset content does not match the training record",
                details,
            )
            .with_warning("dataset has been modified since training"),
            (false, _, false) => VerificationOutcome::new(
                VerificationStatus::Mismatch,
                "dataset verification failed",
                details,
            ),
        };

        if outcome.status == VerificationStatus::PathFallbackMatch {
            warn!(
                request_id,
                source = %outcome.details.provided_source,
                "verified against path text only"
            );
        } else {
            debug!(request_id, status = ?outcome.status, "verify");
        }

        Ok(outcome)
    }

    /// All records, newest first.
    pub async fn list(&self) -> Result<Vec<ProvenanceRecord>> {
        Ok(self.store.list_records().await?)
    }

    pub async fn get(&self, request_id: &RequestId) -> Result<Option<ProvenanceRecord>> {
        Ok(self.store.get_record(request_id).await?)
    }

    /// Like [`get`](Self::get), but a missing record is an error.
    pub async fn record(&self, request_id: &RequestId) -> Result<ProvenanceRecord> {
        self.get(request_id)
            .await?
            .ok_or_else(|| KernelError::RecordNotFound(request_id.clone()))
    }

    /// Compute the content digest of a source.
    ///
    /// Readable sources hash to their Merkle root. A path that cannot be
    /// opened hashes to its own text when `allow_path_fallback` is set;
    /// read errors after opening are never downgraded.
    pub async fn content_digest(&self, source: &Source) -> Result<ResolvedDigest> {
        self.resolve_digest(source, self.config.allow_path_fallback).await
    }

    /// Compute the content digest of a source that must be readable.
    ///
    /// Used when recording provenance: an unopenable path is always a
    /// `SourceRead` error, whatever `allow_path_fallback` says.
    pub async fn dataset_digest(&self, source: &Source) -> Result<ResolvedDigest> {
        self.resolve_digest(source, false).await
    }

    async fn resolve_digest(
        &self,
        source: &Source,
        allow_fallback: bool,
    ) -> Result<ResolvedDigest> {
        match source {
            Source::Bytes { data, .. } => {
                let tree = hash_bytes(data.clone(), self.config.chunk_size).await?;
                Ok(ResolvedDigest {
                    digest: tree.root(),
                    origin: DigestOrigin::Content,
                })
            }
            Source::Path(path) => self.path_digest(path, allow_fallback).await,
        }
    }

    async fn path_digest(&self, path: &Path, allow_fallback: bool) -> Result<ResolvedDigest> {
        if self.config.cache_digests {
            if let Some(cached) = self.cache.read().await.get(path) {
                debug!(path = %path.display(), "digest cache hit");
                return Ok(ResolvedDigest {
                    digest: *cached,
                    origin: DigestOrigin::Content,
                });
            }
        }

        let owned = path.to_path_buf();
        let chunk_size = self.config.chunk_size;

        let root = tokio::task::spawn_blocking(move || -> Result<Option<Digest>> {
            let file = match File::open(&owned) {
                Ok(file) => file,
                Err(_) if allow_fallback => return Ok(None),
                Err(e) => return Err(CoreError::SourceRead(e).into()),
            };
            Ok(Some(hash_reader(file, chunk_size)?.root()))
        })
        .await
        .map_err(|e| KernelError::Task(e.to_string()))??;

        match root {
            Some(root) => {
                if self.config.cache_digests {
                    self.cache.write().await.insert(path.to_path_buf(), root);
                }
                Ok(ResolvedDigest {
                    digest: root,
                    origin: DigestOrigin::Content,
                })
            }
            None => {
                warn!(path = %path.display(), "source unreadable, hashing path text");
                Ok(ResolvedDigest {
                    digest: digest(path.to_string_lossy().as_bytes()),
                    origin: DigestOrigin::PathText,
                })
            }
        }
    }
}

/// Build the Merkle tree of an in-memory payload on the blocking pool.
pub(crate) async fn hash_bytes(data: Bytes, chunk_size: usize) -> Result<MerkleTree> {
    tokio::task::spawn_blocking(move || hash_reader(&data[..], chunk_size))
        .await
        .map_err(|e| KernelError::Task(e.to_string()))?
        .map_err(KernelError::from)
}
