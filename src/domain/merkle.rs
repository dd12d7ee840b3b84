use alloy::primitives::B256;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::crypto::poseidon::poseidon2;

/// Height of the transaction-layer Merkle trees (commitment, message-hash,
/// allow-list and allowed-commitments trees). The pool contract maintains
/// its own, deeper incremental tree on-chain (height 23); the two live at
/// independent layers.
pub const MERKLE_TREE_HEIGHT: usize = 5;

/// Errors from Merkle tree construction and queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleTreeError {
    #[error("tree capacity of {capacity} leaves exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("leaf index {index} is outside the populated range ({len} leaves)")]
    IndexOutOfRange { index: u64, len: usize },
}

/// Inclusion proof: ordered sibling hashes from leaf level to root, plus
/// the leaf index whose bits select the left/right branch at each level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    /// Sibling hashes along the path from leaf to root.
    pub elements: Vec<B256>,
    /// The leaf index in the tree.
    pub index: u64,
}

impl MerklePath {
    /// All-zero path used to pad circuit input vectors for zero-amount
    /// notes. It is never asserted as an inclusion proof.
    pub fn zero(height: usize) -> Self {
        Self {
            elements: vec![B256::ZERO; height],
            index: 0,
        }
    }
}

/// Append-only Merkle tree of fixed height with zero-filled empty leaves.
///
/// Unpopulated positions hold a universal zero sentinel, with per-level
/// empty-subtree hashes precomputed so the root is defined for any
/// prefix-filled tree. Insertion recomputes only the nodes on the path
/// from the new leaf to the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    height: usize,
    /// zeros[l] is the root of an all-empty subtree of depth l.
    zeros: Vec<B256>,
    /// layers[0] holds the populated leaves; layers[l] the populated
    /// prefix of internal nodes at depth height - l.
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Build a tree over the given leaves, in order.
    pub fn new(height: usize, leaves: &[B256]) -> Result<Self, MerkleTreeError> {
        let mut tree = Self::empty(height);
        if leaves.len() > tree.capacity() {
            return Err(MerkleTreeError::CapacityExceeded {
                capacity: tree.capacity(),
            });
        }

        tree.layers[0] = leaves.to_vec();
        for level in 0..height {
            let parent_len = tree.layers[level].len().div_ceil(2);
            let mut parents = Vec::with_capacity(parent_len);
            for i in 0..parent_len {
                parents.push(tree.hash_pair(level, 2 * i));
            }
            tree.layers[level + 1] = parents;
        }

        Ok(tree)
    }

    /// Create an empty tree of the given height.
    pub fn empty(height: usize) -> Self {
        let mut zeros = Vec::with_capacity(height + 1);
        zeros.push(B256::ZERO);
        for level in 0..height {
            let prev = zeros[level];
            zeros.push(poseidon2(prev, prev));
        }

        Self {
            height,
            zeros,
            layers: vec![Vec::new(); height + 1],
        }
    }

    /// Append one leaf, returning its index.
    pub fn insert(&mut self, leaf: B256) -> Result<u64, MerkleTreeError> {
        if self.layers[0].len() >= self.capacity() {
            return Err(MerkleTreeError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        let index = self.layers[0].len();
        self.layers[0].push(leaf);

        let mut current = index;
        for level in 0..self.height {
            let parent = current / 2;
            let hash = self.hash_pair(level, 2 * parent);
            if parent == self.layers[level + 1].len() {
                self.layers[level + 1].push(hash);
            } else {
                self.layers[level + 1][parent] = hash;
            }
            current = parent;
        }

        Ok(index as u64)
    }

    /// Current root. O(1) given the cached internal nodes.
    pub fn root(&self) -> B256 {
        self.layers[self.height]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.height])
    }

    /// Position of the first leaf equal to `leaf`, or `None` if it was
    /// never inserted.
    pub fn index_of(&self, leaf: B256) -> Option<u64> {
        self.layers[0].iter().position(|l| *l == leaf).map(|i| i as u64)
    }

    /// Inclusion proof for the leaf at `index`. Positions beyond the
    /// populated range are rejected; zero-filled padding paths come from
    /// [`MerklePath::zero`] instead.
    pub fn path(&self, index: u64) -> Result<MerklePath, MerkleTreeError> {
        if index as usize >= self.layers[0].len() {
            return Err(MerkleTreeError::IndexOutOfRange {
                index,
                len: self.layers[0].len(),
            });
        }

        let mut elements = Vec::with_capacity(self.height);
        let mut current = index as usize;
        for level in 0..self.height {
            let sibling = current ^ 1;
            elements.push(self.node(level, sibling));
            current /= 2;
        }

        Ok(MerklePath { elements, index })
    }

    /// Recombine a path with a leaf and check the result against `root`.
    pub fn verify(root: B256, leaf: B256, path: &MerklePath) -> bool {
        let mut current = leaf;
        for (level, sibling) in path.elements.iter().enumerate() {
            current = if (path.index >> level) & 1 == 1 {
                poseidon2(*sibling, current)
            } else {
                poseidon2(current, *sibling)
            };
        }
        current == root
    }

    /// Number of populated leaves.
    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    /// Check if no leaf has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// Tree height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Maximum number of leaves.
    pub fn capacity(&self) -> usize {
        1 << self.height
    }

    /// The populated leaves, in insertion order.
    pub fn leaves(&self) -> &[B256] {
        &self.layers[0]
    }

    fn node(&self, level: usize, index: usize) -> B256 {
        self.layers[level]
            .get(index)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    fn hash_pair(&self, level: usize, left_index: usize) -> B256 {
        poseidon2(self.node(level, left_index), self.node(level, left_index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[test]
    fn test_empty_tree_root_is_chained_zeros() {
        let tree = MerkleTree::empty(3);
        let z1 = poseidon2(B256::ZERO, B256::ZERO);
        let z2 = poseidon2(z1, z1);
        let z3 = poseidon2(z2, z2);
        assert_eq!(tree.root(), z3);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_equivalence() {
        let leaves = vec![leaf(1), leaf(2), leaf(3), leaf(4), leaf(5)];
        let built = MerkleTree::new(MERKLE_TREE_HEIGHT, &leaves).unwrap();

        let mut inserted = MerkleTree::empty(MERKLE_TREE_HEIGHT);
        for l in &leaves {
            inserted.insert(*l).unwrap();
        }

        assert_eq!(built.root(), inserted.root());
        assert_eq!(built.len(), inserted.len());
    }

    #[test]
    fn test_inclusion_proof_soundness() {
        let leaves: Vec<B256> = (1..=7).map(leaf).collect();
        let tree = MerkleTree::new(MERKLE_TREE_HEIGHT, &leaves).unwrap();

        for (i, l) in leaves.iter().enumerate() {
            let path = tree.path(i as u64).unwrap();
            assert_eq!(path.elements.len(), MERKLE_TREE_HEIGHT);
            assert!(MerkleTree::verify(tree.root(), *l, &path));
        }

        // Wrong leaf fails
        let path = tree.path(0).unwrap();
        assert!(!MerkleTree::verify(tree.root(), leaf(9), &path));
    }

    #[test]
    fn test_index_of() {
        let leaves = vec![leaf(1), leaf(2), leaf(2)];
        let tree = MerkleTree::new(MERKLE_TREE_HEIGHT, &leaves).unwrap();

        assert_eq!(tree.index_of(leaf(1)), Some(0));
        // First position wins for duplicates
        assert_eq!(tree.index_of(leaf(2)), Some(1));
        assert_eq!(tree.index_of(leaf(8)), None);
    }

    #[test]
    fn test_capacity_exceeded_on_build() {
        let leaves: Vec<B256> = (0..5).map(leaf).collect();
        let err = MerkleTree::new(2, &leaves).unwrap_err();
        assert_eq!(err, MerkleTreeError::CapacityExceeded { capacity: 4 });
    }

    #[test]
    fn test_capacity_exceeded_on_insert() {
        let mut tree = MerkleTree::empty(2);
        for i in 0..4 {
            tree.insert(leaf(i)).unwrap();
        }
        let err = tree.insert(leaf(4)).unwrap_err();
        assert_eq!(err, MerkleTreeError::CapacityExceeded { capacity: 4 });
    }

    #[test]
    fn test_path_index_out_of_range() {
        let tree = MerkleTree::new(MERKLE_TREE_HEIGHT, &[leaf(1)]).unwrap();
        let err = tree.path(1).unwrap_err();
        assert_eq!(err, MerkleTreeError::IndexOutOfRange { index: 1, len: 1 });
    }

    #[test]
    fn test_insert_changes_root() {
        let mut tree = MerkleTree::empty(MERKLE_TREE_HEIGHT);
        let empty_root = tree.root();
        let index = tree.insert(leaf(1)).unwrap();
        assert_eq!(index, 0);
        assert_ne!(tree.root(), empty_root);

        // Earlier proofs keep verifying against the root they were made for
        let root_after_one = tree.root();
        let path = tree.path(0).unwrap();
        tree.insert(leaf(2)).unwrap();
        assert!(MerkleTree::verify(root_after_one, leaf(1), &path));
        assert!(!MerkleTree::verify(tree.root(), leaf(1), &path));
    }
}
