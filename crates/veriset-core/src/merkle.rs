//! Binary Merkle tree over chunk digests.
//!
//! Level 0 holds the leaf digests in chunk order. Each level above is built
//! by hashing adjacent pairs left to right. An odd tail is paired with itself
//! (duplicate-last-node), so every level above 0 has `ceil(n / 2)` entries.
//!
//! All levels are retained so inclusion proofs can be produced after the
//! fact. Trees are immutable and are rebuilt from scratch for every dataset.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::chunk::chunk;
use crate::digest::Digest;
use crate::error::{CoreError, Result};

/// A fully materialized Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// Tree levels from leaves (index 0) to root (last index). Never empty.
    levels: Vec<Vec<Digest>>,
    /// Total number of source bytes hashed into the leaves.
    byte_len: u64,
}

impl MerkleTree {
    /// Build a tree from precomputed leaf digests.
    ///
    /// Returns `EmptyInput` when there are no leaves.
    pub fn from_leaves(leaves: Vec<Digest>) -> Result<Self> {
        Self::from_leaves_with_len(leaves, 0)
    }

    fn from_leaves_with_len(leaves: Vec<Digest>, byte_len: u64) -> Result<Self> {
        if leaves.is_empty() {
            return Err(CoreError::EmptyInput);
        }

        let mut levels = Vec::new();
        let mut current = leaves;

        while current.len() > 1 {
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    Digest::hash_pair(left, right)
                })
                .collect();
            levels.push(current);
            current = next;
        }
        levels.push(current);

        Ok(Self { levels, byte_len })
    }

    /// The root digest.
    pub fn root(&self) -> Digest {
        // Construction guarantees a final level holding exactly one digest.
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves (chunks).
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Leaf digests in chunk order.
    pub fn leaves(&self) -> &[Digest] {
        &self.levels[0]
    }

    /// All levels, leaves first.
    pub fn levels(&self) -> &[Vec<Digest>] {
        &self.levels
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Total source bytes, when the tree was built from chunks.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Produce an inclusion proof for the leaf at `leaf_index`.
    pub fn proof_for(&self, leaf_index: usize) -> Result<InclusionProof> {
        if leaf_index >= self.leaf_count() {
            return Err(CoreError::LeafIndexOutOfBounds {
                index: leaf_index,
                leaf_count: self.leaf_count(),
            });
        }

        let mut path = Vec::with_capacity(self.depth());
        let mut index = leaf_index;

        for level in &self.levels[..self.depth()] {
            let node_is_right = index % 2 == 1;
            let sibling_index = if node_is_right { index - 1 } else { index + 1 };
            // Past the end means this node was paired with itself.
            let sibling = level.get(sibling_index).copied().unwrap_or(level[index]);

            path.push(ProofStep {
                sibling,
                sibling_is_left: node_is_right,
            });
            index /= 2;
        }

        Ok(InclusionProof {
            leaf_index,
            leaf: self.levels[0][leaf_index],
            path,
        })
    }
}

/// One step of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Digest,
    /// True when the sibling is hashed on the left of the running node.
    pub sibling_is_left: bool,
}

/// Sibling path from a leaf up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub leaf: Digest,
    pub path: Vec<ProofStep>,
}

impl InclusionProof {
    /// Fold the path into a root.
    pub fn compute_root(&self) -> Digest {
        self.path.iter().fold(self.leaf, |node, step| {
            if step.sibling_is_left {
                Digest::hash_pair(&step.sibling, &node)
            } else {
                Digest::hash_pair(&node, &step.sibling)
            }
        })
    }

    /// Check the proof against an expected root.
    ///
    /// The direction bits must also agree with `leaf_index`, so a valid path
    /// cannot be replayed under a different position. A path too deep to
    /// encode in a `usize` index never verifies.
    pub fn verify(&self, root: &Digest) -> bool {
        let mut encoded_index = 0usize;
        for (level, step) in self.path.iter().enumerate() {
            if !step.sibling_is_left {
                continue;
            }
            match u32::try_from(level).ok().and_then(|l| 1usize.checked_shl(l)) {
                Some(bit) => encoded_index |= bit,
                None => return false,
            }
        }

        encoded_index == self.leaf_index && &self.compute_root() == root
    }
}

/// Hash each chunk and fold the leaves into a tree.
///
/// The first chunk error aborts construction. Zero chunks is `EmptyInput`.
pub fn build_tree<I, B>(chunks: I) -> Result<MerkleTree>
where
    I: IntoIterator<Item = Result<B>>,
    B: AsRef<[u8]>,
{
    let mut leaves = Vec::new();
    let mut byte_len = 0u64;

    for chunk in chunks {
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        byte_len += bytes.len() as u64;
        leaves.push(Digest::hash(bytes));
    }

    MerkleTree::from_leaves_with_len(leaves, byte_len)
}

/// Chunk a reader and build its tree in one pass.
pub fn hash_reader<R: Read>(reader: R, chunk_size: usize) -> Result<MerkleTree> {
    build_tree(chunk(reader, chunk_size)?)
}
