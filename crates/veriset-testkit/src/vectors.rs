//! Known-answer vectors for Merkle roots.
//!
//! Single-chunk vectors are pinned to published SHA-256 digests. Multi-chunk
//! vectors are checked against [`reference_root`], a direct fold written
//! against `sha2` without going through `veriset-core`.

use sha2::{Digest as _, Sha256};

use veriset_core::hash_reader;

/// A known-answer vector.
#[derive(Debug, Clone)]
pub struct MerkleVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Dataset bytes.
    pub data: &'static [u8],
    /// Chunk size to hash with.
    pub chunk_size: usize,
    /// Expected number of leaves.
    pub expected_leaves: usize,
    /// Expected root (hex), when it is a published digest.
    pub expected_root: Option<&'static str>,
}

/// Get all known-answer vectors.
pub fn all_vectors() -> Vec<MerkleVector> {
    vec![
        MerkleVector {
            name: "abc in one chunk",
            data: b"abc",
            chunk_size: 1024 * 1024,
            expected_leaves: 1,
            // FIPS 180-2 example.
            expected_root: Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
        },
        MerkleVector {
            name: "hello world in one chunk",
            data: b"hello world",
            chunk_size: 64,
            expected_leaves: 1,
            expected_root: Some("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"),
        },
        MerkleVector {
            name: "exactly one full chunk",
            data: b"hello",
            chunk_size: 5,
            expected_leaves: 1,
            expected_root: Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"),
        },
        MerkleVector {
            name: "two leaves",
            data: b"ab",
            chunk_size: 1,
            expected_leaves: 2,
            expected_root: None,
        },
        MerkleVector {
            name: "three leaves, odd tail duplicated",
            data: b"abc",
            chunk_size: 1,
            expected_leaves: 3,
            expected_root: None,
        },
        MerkleVector {
            name: "short final chunk",
            data: b"The quick brown fox jumps over the lazy dog",
            chunk_size: 10,
            expected_leaves: 5,
            expected_root: None,
        },
        MerkleVector {
            name: "eleven leaves",
            data: b"0123456789a",
            chunk_size: 1,
            expected_leaves: 11,
            expected_root: None,
        },
    ]
}

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute a Merkle root directly: hash each chunk, then pair left to right,
/// duplicating the last node of odd levels.
///
/// Panics on empty input.
pub fn reference_root(data: &[u8], chunk_size: usize) -> [u8; 32] {
    let mut level: Vec<[u8; 32]> = data.chunks(chunk_size).map(|c| sha256(&[c])).collect();
    assert!(!level.is_empty(), "reference_root needs at least one chunk");

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                sha256(&[&pair[0], right])
            })
            .collect();
    }
    level[0]
}

/// Verify all vectors.
///
/// Returns (name, passed, detail) per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .into_iter()
        .map(|v| {
            let tree = match hash_reader(v.data, v.chunk_size) {
                Ok(tree) => tree,
                Err(e) => return (v.name.to_string(), false, e.to_string()),
            };

            let actual = tree.root().to_hex();
            let expected = v
                .expected_root
                .map(str::to_string)
                .unwrap_or_else(|| hex::encode(reference_root(v.data, v.chunk_size)));

            let passed = actual == expected && tree.leaf_count() == v.expected_leaves;
            let detail = format!(
                "root {} (expected {}), leaves {} (expected {})",
                actual,
                expected,
                tree.leaf_count(),
                v.expected_leaves
            );
            (v.name.to_string(), passed, detail)
        })
        .collect()
}
