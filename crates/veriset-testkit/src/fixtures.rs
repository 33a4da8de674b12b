//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use veriset::{Registry, RegistryConfig};
use veriset_core::{digest, ProvenanceRecord, RequestId};
use veriset_pipeline::{MemoryBlobStore, MemoryRegistrar, MemoryTrainingService};
use veriset_store::MemoryStore;

/// A registry wired to in-memory collaborators, plus a scratch directory.
pub struct TestFixture {
    pub registry: Registry<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub trainer: Arc<MemoryTrainingService>,
    pub registrar: Arc<MemoryRegistrar>,
    dir: TempDir,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a fixture with a custom configuration.
    ///
    /// The registrar and the trainer's public key are always attached; the
    /// configuration decides whether they are used.
    pub fn with_config(config: RegistryConfig) -> Self {
        let blobs = Arc::new(MemoryBlobStore::new());
        let trainer = Arc::new(MemoryTrainingService::from_seed(&[0x42; 32]));
        let registrar = Arc::new(MemoryRegistrar::new());

        let registry = Registry::new(MemoryStore::new(), blobs.clone(), trainer.clone(), config)
            .expect("fixture config must be valid")
            .with_registrar(registrar.clone())
            .with_enclave_key(trainer.verifying_key());

        Self {
            registry,
            blobs,
            trainer,
            registrar,
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// The scratch directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the scratch directory and return its path.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture file");
        path
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a record whose digest is the plain hash of `content`.
///
/// For content no larger than one chunk that equals its Merkle root.
pub fn make_record(
    request_id: &str,
    content: &[u8],
    label: &str,
    timestamp: i64,
) -> ProvenanceRecord {
    ProvenanceRecord::builder(
        RequestId::new(request_id).expect("non-empty request id"),
        digest(content),
    )
    .source_label(label)
    .artifact_ref(format!("model-{}", request_id))
    .authenticity_tag(format!("tag-{}", request_id))
    .timestamp(timestamp)
    .build()
}
