//! Error types for Veriset Core.

use thiserror::Error;

/// Errors that can occur while chunking, hashing, or building records.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The source produced zero chunks.
    #[error("empty dataset: source produced no chunks")]
    EmptyInput,

    /// The source stream could not be read to completion.
    #[error("failed to read source: {0}")]
    SourceRead(#[from] std::io::Error),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("request identifier must not be empty")]
    EmptyRequestId,

    #[error("leaf index {index} out of bounds for tree with {leaf_count} leaves")]
    LeafIndexOutOfBounds { index: usize, leaf_count: usize },

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
