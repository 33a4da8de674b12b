//! # Veriset Store
//!
//! Storage abstraction for the provenance ledger. Provides a trait-based
//! interface for record persistence with in-memory and SQLite implementations.
//!
//! ## Key Types
//!
//! - [`LedgerStore`] - The async trait for all record storage
//! - [`MemoryStore`] - Ephemeral storage, the default
//! - [`SqliteStore`] - SQLite-based durable storage
//! - [`InsertResult`] - Whether a write created or replaced a record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use veriset_store::{LedgerStore, SqliteStore, MemoryStore};
//!
//! async fn example() {
//!     // Ephemeral ledger
//!     let store = MemoryStore::new();
//!
//!     // Durable ledger
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!     let records = store.list_records().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Keyed by request id**: one record per processing request
//! - **Overwrite, not append**: a second write under a key replaces the record
//! - **Stable ordering**: newest first, equal timestamps in write order

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, LedgerStore};
