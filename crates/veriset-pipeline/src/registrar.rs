//! On-chain dataset registration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use veriset_core::{DatasetId, Digest, IntegrityTag};

use crate::error::Result;

/// Everything the chain learns about a registered dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    pub dataset_id: DatasetId,
    pub blob_id: String,
    pub merkle_root: Digest,
    pub integrity_tag: IntegrityTag,
}

/// Submits registration events to a chain.
#[async_trait]
pub trait ChainRegistrar: Send + Sync {
    /// Submit an event, returning the transaction digest.
    async fn register(&self, event: &RegistrationEvent) -> Result<String>;
}
