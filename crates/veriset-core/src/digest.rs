//! SHA-256 digests: the leaf and node hash of every Merkle tree.
//!
//! Digests travel as lowercase hex, so the serde impls use the hex form
//! rather than a byte array.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;

use crate::error::{CoreError, Result};

/// Width of every digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// Hash raw bytes.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Hash the concatenation `left || right`.
    ///
    /// This is the internal-node rule of the Merkle tree. There is no domain
    /// separation between leaves and nodes.
    pub fn hash_pair(left: &Digest, right: &Digest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Convert to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::InvalidHex(format!("expected {} bytes, got {}", DIGEST_LEN, b.len()))
        })?;
        Ok(Self(arr))
    }
}

/// Hash raw bytes.
pub fn digest(data: &[u8]) -> Digest {
    Digest::hash(data)
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_answer() {
        // FIPS 180-2 test vector.
        assert_eq!(
            digest(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_pair_is_concatenation() {
        let left = digest(b"left");
        let right = digest(b"right");

        let mut joined = Vec::new();
        joined.extend_from_slice(left.as_bytes());
        joined.extend_from_slice(right.as_bytes());

        assert_eq!(Digest::hash_pair(&left, &right), digest(&joined));
        assert_ne!(Digest::hash_pair(&left, &right), Digest::hash_pair(&right, &left));
    }

    #[test]
    fn test_hex_rejects_wrong_length() {
        assert!(Digest::from_hex("abcd").is_err());
        assert!(Digest::from_hex("zz").is_err());
    }

    #[test]
    fn test_serde_uses_hex() {
        let d = digest(b"abc");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));

        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_display_is_full_hex() {
        let d = Digest::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", d), "ab".repeat(32));
        assert!(format!("{:?}", d).starts_with("Digest("));
    }
}
