//! # Veriset Pipeline
//!
//! Interfaces to the collaborators that surround the ledger: the blob store
//! that holds dataset bytes, the training service that produces artifacts,
//! and the chain registrar that publishes dataset registrations.
//!
//! ## Key Types
//!
//! - [`BlobStore`] / [`BlobReceipt`] - Upload and download, with one validated receipt shape
//! - [`TrainingService`] / [`TrainingResponse`] - Signed training results
//! - [`ChainRegistrar`] / [`RegistrationEvent`] - Dataset registration
//!
//! The [`memory`] module has in-process implementations of all three.
//!
//! ## Design Notes
//!
//! - **Validate once**: raw collaborator responses are parsed at this boundary;
//!   an unexpected shape is a `MalformedResponse`, never a guess
//! - **No retries**: failures surface to the caller unchanged

pub mod blob;
pub mod error;
pub mod memory;
pub mod registrar;
pub mod training;

pub use blob::{BlobReceipt, BlobStore, StorageInfo};
pub use error::{PipelineError, Result};
pub use memory::{MemoryBlobStore, MemoryRegistrar, MemoryTrainingService};
pub use registrar::{ChainRegistrar, RegistrationEvent};
pub use training::{
    TrainingOutput, TrainingPayload, TrainingRequest, TrainingResponse, TrainingService,
};

pub use ed25519_dalek::VerifyingKey;
