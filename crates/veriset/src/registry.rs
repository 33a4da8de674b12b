//! The Registry: unified API for dataset registration and training provenance.
//!
//! The Registry ties the ledger to its collaborators. It hashes datasets,
//! uploads them, optionally registers them on chain, runs training, and
//! records what was trained on what.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use veriset_core::{
    CoreError, DatasetId, Digest, HistoryEntry, IntegrityTag, ProvenanceRecord, Source,
};
use veriset_pipeline::{
    BlobReceipt, BlobStore, ChainRegistrar, PipelineError, RegistrationEvent, TrainingRequest,
    TrainingResponse, TrainingService, VerifyingKey,
};
use veriset_store::LedgerStore;

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::ledger::{hash_bytes, ProvenanceLedger, ResolvedDigest, VerificationOutcome};

/// Result of registering a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRegistration {
    pub dataset_id: DatasetId,
    pub blob_reference: BlobReceipt,
    pub merkle_root: Digest,
    pub chunk_count: usize,
    pub file_size: u64,
    pub integrity_tag: IntegrityTag,
    /// Transaction digest, when on-chain registration ran.
    pub tx_digest: Option<String>,
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub record: ProvenanceRecord,
    pub source_digest: ResolvedDigest,
    pub response: TrainingResponse,
}

/// The Registry.
pub struct Registry<S: LedgerStore> {
    ledger: ProvenanceLedger<S>,
    blobs: Arc<dyn BlobStore>,
    trainer: Arc<dyn TrainingService>,
    registrar: Option<Arc<dyn ChainRegistrar>>,
    enclave_key: Option<VerifyingKey>,
}

impl<S: LedgerStore> Registry<S> {
    /// Create a registry. Fails if the configuration is invalid.
    pub fn new(
        store: S,
        blobs: Arc<dyn BlobStore>,
        trainer: Arc<dyn TrainingService>,
        config: RegistryConfig,
    ) -> Result<Self> {
        Ok(Self {
            ledger: ProvenanceLedger::new(store, config)?,
            blobs,
            trainer,
            registrar: None,
            enclave_key: None,
        })
    }

    /// Attach a chain registrar, used when `register_on_chain` is set.
    pub fn with_registrar(mut self, registrar: Arc<dyn ChainRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    /// Attach the key training responses must be signed with.
    pub fn with_enclave_key(mut self, key: VerifyingKey) -> Self {
        self.enclave_key = Some(key);
        self
    }

    pub fn ledger(&self) -> &ProvenanceLedger<S> {
        &self.ledger
    }

    pub fn config(&self) -> &RegistryConfig {
        self.ledger.config()
    }

    /// Hash, upload and (optionally) register a dataset.
    ///
    /// Unreadable sources are an error here; the path-text fallback applies
    /// only to verification.
    #[instrument(skip(self, source), fields(source = %source.label()))]
    pub async fn register_dataset(&self, source: &Source) -> Result<DatasetRegistration> {
        let data = read_source(source).await?;

        let tree = hash_bytes(data.clone(), self.config().chunk_size).await?;
        let merkle_root = tree.root();
        let dataset_id = DatasetId::generate();

        let blob_reference = self.blobs.store_blob(data).await?;
        let integrity_tag = IntegrityTag::derive(&merkle_root, &blob_reference.blob_id);

        let tx_digest = if self.config().register_on_chain {
            match &self.registrar {
                Some(registrar) => {
                    let event = RegistrationEvent {
                        dataset_id,
                        blob_id: blob_reference.blob_id.clone(),
                        merkle_root,
                        integrity_tag: integrity_tag.clone(),
                    };
                    Some(registrar.register(&event).await?)
                }
                None => {
                    warn!("register_on_chain is set but no registrar is attached");
                    None
                }
            }
        } else {
            None
        };

        info!(
            %dataset_id,
            %merkle_root,
            blob_id = %blob_reference.blob_id,
            chunks = tree.leaf_count(),
            bytes = tree.byte_len(),
            "registered dataset"
        );

        Ok(DatasetRegistration {
            dataset_id,
            blob_reference,
            merkle_root,
            chunk_count: tree.leaf_count(),
            file_size: tree.byte_len(),
            integrity_tag,
            tx_digest,
        })
    }

    /// Train on a dataset and record the provenance.
    ///
    /// The record is keyed by the service's `request_hash`, tagged with its
    /// signature, and stamped with its timestamp. The source must be readable;
    /// provenance is never recorded against the path text.
    #[instrument(
        skip(self, source, input_data),
        fields(source = %source.label(), artifact = %artifact_ref)
    )]
    pub async fn train(
        &self,
        source: &Source,
        input_data: impl Into<String>,
        artifact_ref: &str,
    ) -> Result<TrainingRun> {
        let source_digest = self.ledger.dataset_digest(source).await?;

        let response = self
            .trainer
            .process(TrainingRequest {
                input_data: input_data.into(),
            })
            .await?;

        if self.config().verify_training_signatures {
            match &self.enclave_key {
                Some(key) => response.verify_signature(key)?,
                None => warn!("signature verification enabled but no enclave key is set"),
            }
        }

        let timestamp = i64::try_from(response.response.timestamp_ms).map_err(|_| {
            PipelineError::MalformedResponse(format!(
                "timestamp_ms {} out of range",
                response.response.timestamp_ms
            ))
        })?;

        let record = ProvenanceRecord::builder(response.request_id()?, source_digest.digest)
            .source_label(source.label())
            .artifact_ref(artifact_ref)
            .authenticity_tag(response.signature.clone())
            .timestamp(timestamp)
            .build();

        self.ledger.register(record.clone()).await?;

        Ok(TrainingRun {
            record,
            source_digest,
            response,
        })
    }

    /// Verify a candidate dataset against a training record.
    #[instrument(skip(self, candidate), fields(candidate = %candidate.label()))]
    pub async fn verify(
        &self,
        request_id: &str,
        candidate: &Source,
    ) -> Result<VerificationOutcome> {
        self.ledger.verify(request_id, candidate).await
    }

    /// Download a stored blob and verify it against a training record.
    ///
    /// The blob id is used as the candidate's label.
    #[instrument(skip(self))]
    pub async fn verify_blob(
        &self,
        request_id: &str,
        blob_id: &str,
    ) -> Result<VerificationOutcome> {
        let data = self.blobs.read_blob(blob_id).await?;
        self.ledger
            .verify(request_id, &Source::bytes(blob_id, data))
            .await
    }

    /// Training history, newest first.
    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .ledger
            .list()
            .await?
            .iter()
            .map(HistoryEntry::from)
            .collect())
    }
}

async fn read_source(source: &Source) -> Result<Bytes> {
    match source {
        Source::Path(path) => {
            let data = tokio::fs::read(path).await.map_err(CoreError::SourceRead)?;
            Ok(Bytes::from(data))
        }
        Source::Bytes { data, .. } => Ok(data.clone()),
    }
}
