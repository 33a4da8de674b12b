//! Error types for the pipeline module.

use thiserror::Error;

/// Errors returned by collaborators and their boundary types.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The blob store rejected or failed an upload or download.
    #[error("upstream upload failed: {0}")]
    UpstreamUpload(String),

    /// The training service failed.
    #[error("upstream processing failed: {0}")]
    UpstreamProcessing(String),

    /// A collaborator answered, but not in a shape we accept.
    #[error("malformed collaborator response: {0}")]
    MalformedResponse(String),

    /// The training response signature did not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The chain registrar failed.
    #[error("registration failed: {0}")]
    Registration(String),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
