//! In-memory collaborators for tests and local runs.
//!
//! Each one behaves like its remote counterpart closely enough for the
//! registry to be exercised end to end, and each can be switched into a
//! failing mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use veriset_core::digest;

use crate::blob::{BlobReceipt, BlobStore};
use crate::error::{PipelineError, Result};
use crate::registrar::{ChainRegistrar, RegistrationEvent};
use crate::training::{
    TrainingOutput, TrainingPayload, TrainingRequest, TrainingResponse, TrainingService,
};

/// Epoch reported for every blob stored in memory.
const MEMORY_EPOCH: u64 = 1;

/// Storage lifetime, in epochs, reported for stored blobs.
const MEMORY_EPOCHS_AHEAD: u64 = 5;

/// Number of weights the in-memory trainer emits.
const WEIGHT_COUNT: u64 = 10;

/// Content-addressed blob store.
///
/// The blob id is the hex SHA-256 of the bytes, so storing the same bytes
/// twice yields the same id, reported as already certified.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
    failing: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `UpstreamUpload`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of distinct blobs held.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Replace a stored blob's bytes, simulating corruption at rest.
    pub async fn corrupt(&self, blob_id: &str, data: Bytes) {
        if let Some(slot) = self.blobs.write().await.get_mut(blob_id) {
            *slot = data;
        }
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PipelineError::UpstreamUpload("blob store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store_blob(&self, data: Bytes) -> Result<BlobReceipt> {
        self.check_failing()?;

        let blob_id = digest(&data).to_hex();
        let size = data.len() as u64;

        let mut blobs = self.blobs.write().await;
        let response = if blobs.contains_key(&blob_id) {
            json!({
                "alreadyCertified": {
                    "blobId": blob_id,
                    "endEpoch": MEMORY_EPOCH + MEMORY_EPOCHS_AHEAD,
                }
            })
        } else {
            blobs.insert(blob_id.clone(), data);
            json!({
                "newlyCreated": {
                    "blobObject": {
                        "id": format!("0x{}", &blob_id[..16]),
                        "blobId": blob_id,
                        "size": size,
                        "registeredEpoch": MEMORY_EPOCH,
                        "encodingType": "memory",
                        "storage": {
                            "id": format!("0x{}", &blob_id[16..32]),
                            "startEpoch": MEMORY_EPOCH,
                            "endEpoch": MEMORY_EPOCH + MEMORY_EPOCHS_AHEAD,
                            "storageSize": size,
                        }
                    },
                    "cost": 0,
                    "resourceOperation": {
                        "registerFromScratch": { "encodedLength": size }
                    }
                }
            })
        };

        debug!(%blob_id, size, "stored blob");
        BlobReceipt::from_publisher_response(&response)
    }

    async fn read_blob(&self, blob_id: &str) -> Result<Bytes> {
        self.check_failing()?;

        self.blobs
            .read()
            .await
            .get(blob_id)
            .cloned()
            .ok_or_else(|| PipelineError::UpstreamUpload(format!("unknown blob {}", blob_id)))
    }
}

/// A training service that signs its responses with a local Ed25519 key.
///
/// The request hash is the hex SHA-256 of the request's JSON form, and the
/// weights are derived deterministically from it.
pub struct MemoryTrainingService {
    signing_key: SigningKey,
    failing: AtomicBool,
}

impl MemoryTrainingService {
    /// Create with a random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self::with_key(SigningKey::generate(&mut rng))
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::with_key(SigningKey::from_bytes(seed))
    }

    fn with_key(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            failing: AtomicBool::new(false),
        }
    }

    /// The key responses are signed with.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Make every subsequent call fail with `UpstreamProcessing`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

fn derive_weights(request_hash: &str) -> Vec<f64> {
    let seed = request_hash
        .get(..16)
        .and_then(|prefix| u64::from_str_radix(prefix, 16).ok())
        .unwrap_or(0);

    (0..WEIGHT_COUNT)
        .map(|i| (seed.wrapping_add(i) % 10_000) as f64 / 10_000.0)
        .collect()
}

fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[async_trait]
impl TrainingService for MemoryTrainingService {
    async fn process(&self, request: TrainingRequest) -> Result<TrainingResponse> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PipelineError::UpstreamProcessing("enclave unavailable".into()));
        }

        let request_json = serde_json::to_vec(&request)
            .map_err(|e| PipelineError::UpstreamProcessing(e.to_string()))?;
        let request_hash = digest(&request_json).to_hex();

        let payload = TrainingPayload {
            data: TrainingOutput {
                updated_weights: derive_weights(&request_hash),
                request_hash,
            },
            timestamp_ms: now_millis(),
        };

        let signature = self.signing_key.sign(&payload.signing_bytes()?);

        debug!(request_hash = %payload.data.request_hash, "processed training request");

        Ok(TrainingResponse {
            response: payload,
            signature: hex::encode(signature.to_bytes()),
        })
    }
}

/// A registrar that records events instead of submitting them.
#[derive(Default)]
pub struct MemoryRegistrar {
    events: RwLock<Vec<RegistrationEvent>>,
    failing: AtomicBool,
}

impl MemoryRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `Registration`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Events registered so far, oldest first.
    pub async fn events(&self) -> Vec<RegistrationEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl ChainRegistrar for MemoryRegistrar {
    async fn register(&self, event: &RegistrationEvent) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PipelineError::Registration("chain unavailable".into()));
        }

        let encoded = serde_json::to_vec(event)
            .map_err(|e| PipelineError::Registration(e.to_string()))?;
        let tx_digest = digest(&encoded).to_hex();

        self.events.write().await.push(event.clone());
        debug!(dataset_id = %event.dataset_id, %tx_digest, "registered dataset");

        Ok(tx_digest)
    }
}
