//! Registry and store configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use veriset_core::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use veriset_store::{LedgerStore, MemoryStore, SqliteStore};

use crate::error::{KernelError, Result};

/// Configuration for the Registry and its ledger.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum chunk size in bytes.
    pub chunk_size: usize,
    /// Remember content digests by path for the life of the ledger.
    ///
    /// Entries are never evicted, so a file rewritten in place keeps its old
    /// digest until the ledger is dropped.
    pub cache_digests: bool,
    /// Hash the path text when a path cannot be opened.
    pub allow_path_fallback: bool,
    /// Submit a registration event for every registered dataset.
    pub register_on_chain: bool,
    /// Reject training responses whose signature does not verify.
    pub verify_training_signatures: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache_digests: true,
            allow_path_fallback: true,
            register_on_chain: false,
            verify_training_signatures: false,
        }
    }
}

impl RegistryConfig {
    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| KernelError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(KernelError::InvalidConfig(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(KernelError::InvalidConfig(format!(
                "chunk_size {} exceeds the maximum of {} bytes",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        Ok(())
    }
}

/// Which ledger backend to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Records live in memory and are lost on restart.
    #[default]
    Memory,
    /// Records persist in a SQLite file.
    Sqlite { path: PathBuf },
}

/// Open the configured ledger backend.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn LedgerStore>> {
    let store: Arc<dyn LedgerStore> = match config {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::Sqlite { path } => Arc::new(SqliteStore::open(path)?),
    };
    tracing::debug!(?config, "opened ledger store");
    Ok(store)
}
