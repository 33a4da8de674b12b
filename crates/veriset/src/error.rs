//! Error types for Veriset.

use thiserror::Error;
use veriset_core::{CoreError, RequestId};
use veriset_pipeline::PipelineError;
use veriset_store::StoreError;

/// Errors that can occur during registry and ledger operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Chunking, hashing or identifier validation failed.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A collaborator failed or answered badly.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// No record under this request identifier.
    #[error("no record for request {0}")]
    RecordNotFound(RequestId),

    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A hashing task did not complete.
    #[error("hashing task failed: {0}")]
    Task(String),
}

/// Coarse classification of a [`KernelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyInput,
    SourceReadFailure,
    RecordNotFound,
    UpstreamUploadFailure,
    UpstreamProcessingFailure,
    MalformedCollaboratorResponse,
    InvalidInput,
    Storage,
}

impl KernelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::Core(CoreError::EmptyInput) => ErrorKind::EmptyInput,
            KernelError::Core(CoreError::SourceRead(_)) => ErrorKind::SourceReadFailure,
            KernelError::Core(_) => ErrorKind::InvalidInput,
            KernelError::Store(_) => ErrorKind::Storage,
            KernelError::Pipeline(PipelineError::UpstreamUpload(_)) => {
                ErrorKind::UpstreamUploadFailure
            }
            KernelError::Pipeline(PipelineError::MalformedResponse(_)) => {
                ErrorKind::MalformedCollaboratorResponse
            }
            KernelError::Pipeline(
                PipelineError::UpstreamProcessing(_)
                | PipelineError::InvalidSignature(_)
                | PipelineError::Registration(_),
            ) => ErrorKind::UpstreamProcessingFailure,
            KernelError::RecordNotFound(_) => ErrorKind::RecordNotFound,
            KernelError::InvalidConfig(_) => ErrorKind::InvalidInput,
            KernelError::Task(_) => ErrorKind::SourceReadFailure,
        }
    }

    /// True when a collaborator, not the caller's input, caused the failure.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UpstreamUploadFailure
                | ErrorKind::UpstreamProcessingFailure
                | ErrorKind::MalformedCollaboratorResponse
        )
    }
}

/// Result type for Veriset operations.
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let empty: KernelError = CoreError::EmptyInput.into();
        assert_eq!(empty.kind(), ErrorKind::EmptyInput);
        assert!(!empty.is_upstream());

        let io: KernelError =
            CoreError::SourceRead(std::io::Error::new(std::io::ErrorKind::Other, "boom")).into();
        assert_eq!(io.kind(), ErrorKind::SourceReadFailure);

        let upload: KernelError = PipelineError::UpstreamUpload("down".into()).into();
        assert_eq!(upload.kind(), ErrorKind::UpstreamUploadFailure);
        assert!(upload.is_upstream());

        let malformed: KernelError = PipelineError::MalformedResponse("no id".into()).into();
        assert_eq!(malformed.kind(), ErrorKind::MalformedCollaboratorResponse);
        assert!(malformed.is_upstream());

        let store: KernelError = StoreError::Poisoned.into();
        assert_eq!(store.kind(), ErrorKind::Storage);
        assert!(!store.is_upstream());
    }
}
