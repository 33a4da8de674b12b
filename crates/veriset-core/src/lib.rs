//! # Veriset Core
//!
//! Pure primitives for Veriset: chunking, Merkle roots, and provenance records.
//!
//! This crate does no networking and owns no shared state. The only I/O it
//! performs is reading whatever `Read` handle the caller passes to the chunker.
//!
//! ## Key Types
//!
//! - [`Digest`] - 32-byte SHA-256 digest, hex on the wire
//! - [`MerkleTree`] - All levels of a dataset's tree, plus inclusion proofs
//! - [`DatasetId`] - Random 128-bit dataset label
//! - [`RequestId`] - Ledger key returned by the processing service
//! - [`ProvenanceRecord`] - What the ledger stores per processing event
//! - [`IntegrityTag`] - Non-verifiable checksum stub bound to a root
//!
//! ## Hashing a dataset
//!
//! ```
//! use veriset_core::{hash_reader, digest, DEFAULT_CHUNK_SIZE};
//!
//! let tree = hash_reader(&b"hello"[..], DEFAULT_CHUNK_SIZE).unwrap();
//! assert_eq!(tree.leaf_count(), 1);
//! assert_eq!(tree.root(), digest(b"hello"));
//! ```

pub mod chunk;
pub mod digest;
pub mod error;
pub mod merkle;
pub mod record;
pub mod source;
pub mod tag;
pub mod types;

pub use chunk::{chunk, Chunker, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
pub use digest::{digest, Digest, DIGEST_LEN};
pub use error::{CoreError, Result};
pub use merkle::{build_tree, hash_reader, InclusionProof, MerkleTree, ProofStep};
pub use record::{HistoryEntry, ProvenanceRecord, RecordBuilder};
pub use source::Source;
pub use tag::IntegrityTag;
pub use types::{DatasetId, RequestId};
