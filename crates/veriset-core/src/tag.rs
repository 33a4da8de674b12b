//! Integrity tags.
//!
//! An integrity tag is a short, deterministic token derived from a Merkle
//! root and a blob identifier. It is a checksum stub, not a proof: anyone who
//! knows the root and blob id can produce it, and nothing can verify who did.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::digest::Digest;

/// Fixed prefix of every tag.
pub const TAG_PREFIX: &[u8] = b"itag-";

/// Bytes taken from the root and from the blob id.
pub const TAG_PART_LEN: usize = 8;

/// A non-verifiable integrity tag.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegrityTag(Vec<u8>);

impl IntegrityTag {
    /// Derive the tag `prefix || root[..8] || blob_id[..8]`.
    ///
    /// A blob id shorter than eight bytes is taken whole.
    pub fn derive(root: &Digest, blob_id: &str) -> Self {
        let blob = blob_id.as_bytes();
        let blob_part = &blob[..blob.len().min(TAG_PART_LEN)];

        let mut bytes = Vec::with_capacity(TAG_PREFIX.len() + 2 * TAG_PART_LEN);
        bytes.extend_from_slice(TAG_PREFIX);
        bytes.extend_from_slice(&root.as_bytes()[..TAG_PART_LEN]);
        bytes.extend_from_slice(blob_part);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for IntegrityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntegrityTag({})", self.to_hex())
    }
}
