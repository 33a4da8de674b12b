//! Blob storage: the object store that holds dataset bytes.
//!
//! The publisher answers an upload in one of two JSON shapes. Both are
//! parsed once, here, into a [`BlobReceipt`]; nothing downstream looks at the
//! raw response again.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Storage reservation backing a blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub id: String,
    pub start_epoch: u64,
    pub end_epoch: u64,
    pub storage_size: u64,
}

/// A validated upload result.
///
/// `blob_id` is guaranteed non-empty. Every other field is informational and
/// defaults to zero or empty when the publisher omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobReceipt {
    pub blob_id: String,
    pub blob_object_id: String,
    pub size: u64,
    pub registered_epoch: u64,
    pub encoding_type: String,
    pub storage: StorageInfo,
    pub cost: u64,
    pub encoded_length: u64,
}

impl BlobReceipt {
    /// A receipt carrying only a blob id.
    pub fn new(blob_id: impl Into<String>) -> Result<Self> {
        let blob_id = blob_id.into();
        if blob_id.is_empty() {
            return Err(PipelineError::MalformedResponse("empty blob id".into()));
        }
        Ok(Self {
            blob_id,
            blob_object_id: String::new(),
            size: 0,
            registered_epoch: 0,
            encoding_type: String::new(),
            storage: StorageInfo::default(),
            cost: 0,
            encoded_length: 0,
        })
    }

    /// Parse a publisher response.
    ///
    /// Accepts `{"newlyCreated": {...}}`, with the blob id either directly
    /// under `newlyCreated` or under `newlyCreated.blobObject`, and
    /// `{"alreadyCertified": {"blobId", "endEpoch"}}`. Anything else is a
    /// `MalformedResponse`.
    pub fn from_publisher_response(response: &Value) -> Result<Self> {
        if let Some(created) = response.get("newlyCreated") {
            return Self::from_newly_created(created);
        }
        if let Some(certified) = response.get("alreadyCertified") {
            return Self::from_already_certified(certified);
        }
        Err(PipelineError::MalformedResponse(
            "expected newlyCreated or alreadyCertified".into(),
        ))
    }

    fn from_newly_created(created: &Value) -> Result<Self> {
        let object = created.get("blobObject").unwrap_or(&Value::Null);
        let storage = object.get("storage").unwrap_or(&Value::Null);

        let blob_id = str_field(created, "blobId")
            .or_else(|| str_field(object, "blobId"))
            .ok_or_else(|| PipelineError::MalformedResponse("blobId missing".into()))?;

        let mut receipt = Self::new(blob_id)?;
        receipt.blob_object_id = str_field(object, "id").unwrap_or_default();
        receipt.size = u64_field(object, "size");
        receipt.registered_epoch = u64_field(object, "registeredEpoch");
        receipt.encoding_type = str_field(object, "encodingType").unwrap_or_default();
        receipt.storage = StorageInfo {
            id: str_field(storage, "id").unwrap_or_default(),
            start_epoch: u64_field(storage, "startEpoch"),
            end_epoch: u64_field(storage, "endEpoch"),
            storage_size: u64_field(storage, "storageSize"),
        };
        receipt.cost = u64_field(created, "cost");
        receipt.encoded_length = created
            .pointer("/resourceOperation/registerFromScratch/encodedLength")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Ok(receipt)
    }

    fn from_already_certified(certified: &Value) -> Result<Self> {
        let blob_id = str_field(certified, "blobId")
            .ok_or_else(|| PipelineError::MalformedResponse("blobId missing".into()))?;

        let mut receipt = Self::new(blob_id)?;
        receipt.storage.end_epoch = u64_field(certified, "endEpoch");
        Ok(receipt)
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn u64_field(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Object storage for dataset bytes.
///
/// Implementations must be thread-safe (Send + Sync). Failures are reported
/// as `UpstreamUpload`; callers decide whether to retry.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes, returning a validated receipt.
    async fn store_blob(&self, data: Bytes) -> Result<BlobReceipt>;

    /// Download a previously stored blob.
    async fn read_blob(&self, blob_id: &str) -> Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_newly_created_with_top_level_id() {
        let response = json!({
            "newlyCreated": {
                "blobId": "blob-123",
                "cost": 42,
                "blobObject": {
                    "id": "0xobj",
                    "size": 1024,
                    "registeredEpoch": 7,
                    "encodingType": "RedStuff",
                    "storage": {
                        "id": "0xstore",
                        "startEpoch": 7,
                        "endEpoch": 12,
                        "storageSize": 66034000
                    }
                },
                "resourceOperation": {
                    "registerFromScratch": { "encodedLength": 66034000 }
                }
            }
        });

        let receipt = BlobReceipt::from_publisher_response(&response).unwrap();
        assert_eq!(receipt.blob_id, "blob-123");
        assert_eq!(receipt.blob_object_id, "0xobj");
        assert_eq!(receipt.size, 1024);
        assert_eq!(receipt.registered_epoch, 7);
        assert_eq!(receipt.encoding_type, "RedStuff");
        assert_eq!(receipt.storage.end_epoch, 12);
        assert_eq!(receipt.cost, 42);
        assert_eq!(receipt.encoded_length, 66034000);
    }

    #[test]
    fn test_newly_created_with_nested_id() {
        let response = json!({
            "newlyCreated": { "blobObject": { "blobId": "nested" } }
        });

        let receipt = BlobReceipt::from_publisher_response(&response).unwrap();
        assert_eq!(receipt.blob_id, "nested");
        assert_eq!(receipt.size, 0);
        assert_eq!(receipt.storage, StorageInfo::default());
    }

    #[test]
    fn test_already_certified() {
        let response = json!({
            "alreadyCertified": { "blobId": "known", "endEpoch": 99 }
        });

        let receipt = BlobReceipt::from_publisher_response(&response).unwrap();
        assert_eq!(receipt.blob_id, "known");
        assert_eq!(receipt.storage.end_epoch, 99);
    }

    #[test]
    fn test_rejects_malformed_shapes() {
        let cases = [
            json!("blob-as-string"),
            json!(null),
            json!({ "id": "something" }),
            json!({ "newlyCreated": { "blobObject": {} } }),
            json!({ "newlyCreated": { "blobId": "" } }),
            json!({ "newlyCreated": { "blobId": 17 } }),
            json!({ "alreadyCertified": {} }),
        ];

        for case in cases {
            let err = BlobReceipt::from_publisher_response(&case).unwrap_err();
            assert!(
                matches!(err, PipelineError::MalformedResponse(_)),
                "accepted {}",
                case
            );
        }
    }
}
