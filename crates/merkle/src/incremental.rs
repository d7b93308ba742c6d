//! Dense, append-only Merkle tree addressed by leaf index.
//!
//! Leaves are appended left to right. Only nodes above written leaves are
//! materialized; everything to the right of the last leaf is read from the
//! zero-hash table, so memory grows with the number of insertions rather than
//! with `arity^depth`.

use std::sync::Arc;

use accumulator_hash::{field, HashError, HashStrategy};
use ark_ff::PrimeField;
use rayon::prelude::*;
use tracing::debug;

use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::proof::MerkleProof;
use crate::zero::ZeroHashes;

pub struct IncrementalMerkleTree<F: PrimeField, H> {
    hasher: H,
    zeros: Arc<ZeroHashes<F>>,
    /// `nodes[level]` for `level < depth`; `nodes[0]` are the leaves.
    nodes: Vec<Vec<F>>,
    root: F,
    capacity: u128,
}

impl<F: PrimeField, H: HashStrategy<F>> IncrementalMerkleTree<F, H> {
    /// Create an empty tree; the arity is taken from the hasher.
    pub fn new(hasher: H, depth: usize, zero_leaf: F) -> Result<Self> {
        check_tree_arity(hasher.arity())?;
        let zeros = Arc::new(ZeroHashes::new(&hasher, depth, zero_leaf)?);
        Self::with_zero_hashes(hasher, zeros)
    }

    /// Create an empty tree from a configuration.
    pub fn from_config(hasher: H, config: &TreeConfig) -> Result<Self> {
        config.validate()?;
        if hasher.arity() != config.arity {
            return Err(TreeError::ArityMismatch {
                tree: config.arity,
                hash: hasher.arity(),
            });
        }
        Self::new(hasher, config.depth, config.zero_leaf_value()?)
    }

    /// Create an empty tree reusing a (possibly cached) zero-hash table.
    pub fn with_zero_hashes(hasher: H, zeros: Arc<ZeroHashes<F>>) -> Result<Self> {
        let arity = hasher.arity();
        check_tree_arity(arity)?;
        if zeros.arity() != arity {
            return Err(TreeError::ArityMismatch {
                tree: zeros.arity(),
                hash: arity,
            });
        }

        let depth = zeros.depth();
        let capacity = (arity as u128)
            .checked_pow(depth as u32)
            .unwrap_or(u128::MAX);

        debug!(depth, arity, hasher = hasher.id(), "created incremental tree");
        Ok(Self {
            root: zeros.root(),
            nodes: vec![Vec::new(); depth],
            hasher,
            zeros,
            capacity,
        })
    }

    /// Build a tree holding `leaves`, hashing each level in parallel.
    ///
    /// Produces the same root as inserting the leaves one at a time.
    pub fn from_leaves(hasher: H, depth: usize, zero_leaf: F, leaves: Vec<F>) -> Result<Self> {
        let mut tree = Self::new(hasher, depth, zero_leaf)?;
        if leaves.len() as u128 > tree.capacity {
            return Err(TreeError::TreeFull {
                capacity: tree.capacity,
            });
        }

        let arity = tree.arity();
        let mut level_nodes = leaves;
        for level in 0..depth {
            let zero = tree.zeros.level(level);
            let hasher = &tree.hasher;
            let parents = level_nodes
                .par_chunks(arity)
                .map(|chunk| {
                    let mut children = chunk.to_vec();
                    children.resize(arity, zero);
                    hasher.hash(&children)
                })
                .collect::<std::result::Result<Vec<F>, HashError>>()?;

            tree.nodes[level] = level_nodes;
            level_nodes = parents;
        }
        tree.root = level_nodes.first().copied().unwrap_or_else(|| tree.zeros.root());

        debug!(depth, leaves = tree.len(), root = %field::to_hex(&tree.root), "built incremental tree from leaves");
        Ok(tree)
    }

    pub fn root(&self) -> F {
        self.root
    }

    pub fn depth(&self) -> usize {
        self.zeros.depth()
    }

    pub fn arity(&self) -> usize {
        self.hasher.arity()
    }

    /// Maximum number of leaves, `arity^depth`.
    pub fn capacity(&self) -> u128 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.nodes[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].is_empty()
    }

    pub fn leaves(&self) -> &[F] {
        &self.nodes[0]
    }

    pub fn zero_hashes(&self) -> &ZeroHashes<F> {
        &self.zeros
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Index of the first leaf equal to `leaf`.
    pub fn index_of(&self, leaf: &F) -> Option<usize> {
        self.nodes[0].iter().position(|l| l == leaf)
    }

    /// Append `leaf` at the next free index and return that index.
    pub fn insert(&mut self, leaf: F) -> Result<usize> {
        let index = self.len();
        if index as u128 >= self.capacity {
            return Err(TreeError::TreeFull {
                capacity: self.capacity,
            });
        }

        self.write_path(index, leaf)?;
        debug!(index, root = %field::to_hex(&self.root), "inserted leaf");
        Ok(index)
    }

    /// Overwrite an existing leaf.
    pub fn update(&mut self, index: usize, leaf: F) -> Result<()> {
        self.check_index(index)?;
        self.write_path(index, leaf)?;
        debug!(index, root = %field::to_hex(&self.root), "updated leaf");
        Ok(())
    }

    /// Reset a leaf to the empty value. The leaf count does not change.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        let zero = self.zeros.zero_leaf();
        self.update(index, zero)
    }

    /// Proof for the leaf at `index` against the current root.
    pub fn create_proof(&self, index: usize) -> Result<MerkleProof<F>> {
        self.check_index(index)?;

        let arity = self.arity();
        let depth = self.depth();
        let mut siblings = Vec::with_capacity(depth);
        let mut path_indices = Vec::with_capacity(depth);

        let mut index = index;
        for level in 0..depth {
            let position = index % arity;
            let start = index - position;
            siblings.push(
                (start..start + arity)
                    .filter(|&i| i != index)
                    .map(|i| self.node(level, i))
                    .collect(),
            );
            path_indices.push(position);
            index /= arity;
        }

        Ok(MerkleProof::new(siblings, path_indices))
    }

    /// Check `proof` for `leaf` against the current root.
    pub fn verify_proof(&self, proof: &MerkleProof<F>, leaf: F) -> bool {
        proof.depth() == self.depth() && proof.verify(&self.hasher, leaf, self.root)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(TreeError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    fn node(&self, level: usize, index: usize) -> F {
        self.nodes[level]
            .get(index)
            .copied()
            .unwrap_or_else(|| self.zeros.level(level))
    }

    /// Recompute the path above `index`. Nothing is written unless every hash succeeds.
    fn write_path(&mut self, index: usize, leaf: F) -> Result<()> {
        let arity = self.arity();
        let depth = self.depth();
        let mut path = Vec::with_capacity(depth);

        let mut node = leaf;
        let mut index = index;
        for level in 0..depth {
            path.push((level, index, node));

            let position = index % arity;
            let start = index - position;
            let children: Vec<F> = (start..start + arity)
                .map(|i| if i == index { node } else { self.node(level, i) })
                .collect();
            node = self.hasher.hash(&children)?;
            index /= arity;
        }

        for (level, index, value) in path {
            let row = &mut self.nodes[level];
            if index >= row.len() {
                row.resize(index + 1, self.zeros.level(level));
            }
            row[index] = value;
        }
        self.root = node;
        Ok(())
    }
}

fn check_tree_arity(arity: usize) -> Result<()> {
    if arity < 2 {
        return Err(TreeError::InvalidArity(arity));
    }
    Ok(())
}
