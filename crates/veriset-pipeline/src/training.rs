//! The remote training service and its signed responses.

use async_trait::async_trait;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use veriset_core::RequestId;

use crate::error::{PipelineError, Result};

/// Input to the training service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub input_data: String,
}

/// What the service computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutput {
    /// Hex digest identifying this request; used as the ledger key.
    pub request_hash: String,
    pub updated_weights: Vec<f64>,
}

/// The signed body of a training response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPayload {
    pub data: TrainingOutput,
    pub timestamp_ms: u64,
}

impl TrainingPayload {
    /// The exact bytes the service signs: compact JSON in field order.
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| PipelineError::MalformedResponse(format!("unserializable payload: {}", e)))
    }
}

/// A training response: payload plus hex Ed25519 signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResponse {
    pub response: TrainingPayload,
    pub signature: String,
}

impl TrainingResponse {
    /// The ledger key for this response.
    pub fn request_id(&self) -> Result<RequestId> {
        RequestId::new(self.response.data.request_hash.as_str())
            .map_err(|_| PipelineError::MalformedResponse("empty request_hash".into()))
    }

    /// Check the signature against the enclave's public key.
    pub fn verify_signature(&self, public_key: &VerifyingKey) -> Result<()> {
        let sig_bytes = hex::decode(&self.signature)
            .map_err(|e| PipelineError::InvalidSignature(format!("signature is not hex: {}", e)))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|e| PipelineError::InvalidSignature(e.to_string()))?;

        public_key
            .verify(&self.response.signing_bytes()?, &signature)
            .map_err(|e| PipelineError::InvalidSignature(e.to_string()))
    }
}

/// The remote processing/training service.
#[async_trait]
pub trait TrainingService: Send + Sync {
    /// Run one training request.
    async fn process(&self, request: TrainingRequest) -> Result<TrainingResponse>;
}
