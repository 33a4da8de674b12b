//! Dataset sources.

use std::path::{Path, PathBuf};

use bytes::Bytes;

/// Where dataset bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A local file. The label is the path text.
    Path(PathBuf),
    /// An in-memory payload, e.g. an uploaded file, with its display label.
    Bytes { label: String, data: Bytes },
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(label: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            label: label.into(),
            data: data.into(),
        }
    }

    /// The label recorded in the ledger and compared on verification.
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.to_string_lossy().into_owned(),
            Self::Bytes { label, .. } => label.clone(),
        }
    }

    /// The path, for file-backed sources.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Bytes { .. } => None,
        }
    }
}
