//! # Veriset Testkit
//!
//! Testing utilities for Veriset.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Known-answer vectors**: Merkle roots checked against FIPS digests and an
//!   independent reference fold
//! - **Generators**: Proptest strategies for datasets, mutations and records
//! - **Fixtures**: A registry wired to in-memory collaborators and a temp dir
//!
//! ## Known-answer vectors
//!
//! ```rust
//! use veriset_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, detail) in verify_all_vectors() {
//!     assert!(ok, "{}: {}", name, detail);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use veriset_testkit::generators::dataset;
//!
//! proptest! {
//!     #[test]
//!     fn root_is_deterministic(data in dataset(4096)) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use veriset_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let path = fixture.write_file("train.csv", b"a,b\n1,2\n");
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{make_record, TestFixture};
pub use generators::{dataset, dataset_with_mutation, mutate, RecordParams};
pub use vectors::{all_vectors, reference_root, verify_all_vectors, MerkleVector};

/// Install a test subscriber that honours `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
