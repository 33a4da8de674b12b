//! # Veriset
//!
//! Content-addressed dataset integrity and a provenance ledger for training
//! runs.
//!
//! ## Overview
//!
//! - **Merkle roots**: datasets are chunked and folded into a SHA-256 Merkle
//!   tree; the root fingerprints the exact bytes
//! - **Provenance ledger**: each training run is recorded under the request
//!   identifier the training service returns
//! - **Verification**: a candidate dataset is rehashed and compared against
//!   the recorded digest
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use veriset::{Registry, RegistryConfig, Source};
//! use veriset::pipeline::{MemoryBlobStore, MemoryTrainingService};
//! use veriset::store::MemoryStore;
//!
//! async fn example() -> veriset::Result<()> {
//!     let registry = Registry::new(
//!         MemoryStore::new(),
//!         Arc::new(MemoryBlobStore::new()),
//!         Arc::new(MemoryTrainingService::generate()),
//!         RegistryConfig::default(),
//!     )?;
//!
//!     let source = Source::path("train.csv");
//!     let registration = registry.register_dataset(&source).await?;
//!     println!("root {}", registration.merkle_root);
//!
//!     let run = registry.train(&source, "epochs=3", "model-v1").await?;
//!     let outcome = registry
//!         .verify(run.record.request_id.as_str(), &source)
//!         .await?;
//!     assert!(outcome.valid);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `veriset::core` - Digests, chunking, Merkle trees, records
//! - `veriset::store` - Ledger storage
//! - `veriset::pipeline` - Collaborator interfaces

pub mod config;
pub mod error;
pub mod ledger;
pub mod registry;

pub use veriset_core as core;
pub use veriset_pipeline as pipeline;
pub use veriset_store as store;

pub use config::{open_store, RegistryConfig, StoreConfig};
pub use error::{ErrorKind, KernelError, Result};
pub use ledger::{
    DigestOrigin, ProvenanceLedger, ResolvedDigest, VerificationDetails, VerificationOutcome,
    VerificationStatus,
};
pub use registry::{DatasetRegistration, Registry, TrainingRun};

pub use veriset_core::{
    digest, hash_reader, DatasetId, Digest, HistoryEntry, IntegrityTag, MerkleTree,
    ProvenanceRecord, RequestId, Source,
};
