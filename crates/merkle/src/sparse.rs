//! Binary sparse Merkle tree over a `2^depth` key space.
//!
//! Nodes live in an external [`NodeStore`]; only nodes on written paths are
//! persisted and every missing node is the zero hash of its level. The key's
//! bit `i` (least-significant first) chooses the left (0) or right (1) child at
//! level `i`, with level 0 being the leaves.
//!
//! Mutation is single-writer: concurrent `update`s against one store can
//! interleave their node writes. A failed `update` leaves the backend in an
//! intermediate state and the in-memory root untouched. The leaf record is
//! written last, so retrying the same update repairs the path; otherwise
//! callers rebuild from their canonical source before trusting the tree.

use std::sync::Arc;

use accumulator_hash::{field, HashStrategy};
use ark_ff::PrimeField;
use tracing::{debug, warn};

use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::proof::{index_bits, MerkleProof};
use crate::store::{NodeKey, NodeStore, StoreError};
use crate::zero::ZeroHashes;

pub struct SparseMerkleTree<F: PrimeField, H, S> {
    store: Arc<S>,
    hasher: H,
    zeros: Arc<ZeroHashes<F>>,
    root: F,
    num_leaves: u64,
}

impl<F, H, S> SparseMerkleTree<F, H, S>
where
    F: PrimeField,
    H: HashStrategy<F>,
    S: NodeStore<F>,
{
    /// Open the tree persisted in `store`, or start an empty one.
    pub async fn create(store: Arc<S>, depth: usize, zero_leaf: F, hasher: H) -> Result<Self> {
        check_binary(&hasher)?;
        let zeros = Arc::new(ZeroHashes::new(&hasher, depth, zero_leaf)?);
        Self::create_with_zero_hashes(store, zeros, hasher).await
    }

    pub async fn create_from_config(store: Arc<S>, config: &TreeConfig, hasher: H) -> Result<Self> {
        config.validate()?;
        if config.arity != 2 {
            return Err(TreeError::ArityMismatch {
                tree: config.arity,
                hash: hasher.arity(),
            });
        }
        Self::create(store, config.depth, config.zero_leaf_value()?, hasher).await
    }

    /// Open with a (possibly cached) zero-hash table built from the same hasher.
    pub async fn create_with_zero_hashes(
        store: Arc<S>,
        zeros: Arc<ZeroHashes<F>>,
        hasher: H,
    ) -> Result<Self> {
        check_binary(&hasher)?;
        if zeros.arity() != 2 {
            return Err(TreeError::ArityMismatch {
                tree: 2,
                hash: zeros.arity(),
            });
        }

        let depth = zeros.depth();
        let root = store
            .get(&NodeKey::root(depth))
            .await?
            .unwrap_or_else(|| zeros.root());
        let num_leaves = match store.get(&NodeKey::LeafCount).await? {
            Some(count) => field::to_u64(&count).ok_or_else(|| StoreError::Corrupted {
                key: NodeKey::LeafCount,
                reason: format!("leaf count {} does not fit in u64", field::to_decimal_string(&count)),
            })?,
            None => 0,
        };

        debug!(depth, num_leaves, root = %field::to_hex(&root), "opened sparse tree");
        Ok(Self {
            store,
            hasher,
            zeros,
            root,
            num_leaves,
        })
    }

    pub fn root(&self) -> F {
        self.root
    }

    pub fn depth(&self) -> usize {
        self.zeros.depth()
    }

    /// Number of distinct keys ever written.
    pub fn num_leaves(&self) -> u64 {
        self.num_leaves
    }

    pub fn zero_hashes(&self) -> &ZeroHashes<F> {
        &self.zeros
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Set the leaf at `key` to `value` and recompute its path.
    pub async fn update(&mut self, key: F, value: F) -> Result<()> {
        let index = self.key_index(&key)?;
        self.update_index(index, value).await
    }

    /// [`update`](Self::update) with a native key.
    ///
    /// Ancestors are written root-ward first and the leaf record last, so a
    /// stored leaf always has its path above it. Retrying an update that
    /// failed partway rewrites the whole path.
    pub async fn update_index(&mut self, index: u64, value: F) -> Result<()> {
        self.check_index(index)?;

        let leaf_key = NodeKey::leaf(index);
        let previous = self.store.get(&leaf_key).await?;
        if previous == Some(value) {
            return Ok(());
        }

        let depth = self.depth();
        let mut writes = Vec::with_capacity(depth + 2);

        let mut node = value;
        let mut position = index;
        for level in 0..depth {
            let sibling = self.node(level, position ^ 1).await?;
            node = if position & 1 == 0 {
                self.hasher.hash_pair(node, sibling)?
            } else {
                self.hasher.hash_pair(sibling, node)?
            };
            position >>= 1;
            writes.push((NodeKey::node(level + 1, position), node));
        }

        let is_new = previous.is_none();
        if is_new {
            writes.push((NodeKey::LeafCount, F::from(self.num_leaves + 1)));
        }
        writes.push((leaf_key, value));

        for (key, value) in writes {
            self.write(&key, value).await?;
        }
        if is_new {
            self.num_leaves += 1;
        }
        self.root = node;

        debug!(key = index, root = %field::to_hex(&self.root), "updated sparse leaf");
        Ok(())
    }

    /// Stored value at `key`, or the zero leaf.
    pub async fn get_leaf(&self, key: F) -> Result<F> {
        let index = self.key_index(&key)?;
        self.node(0, index).await
    }

    /// Sibling path for `key`. Empty paths are valid and yield zero hashes.
    pub async fn get_merkle_proof(&self, key: F) -> Result<MerkleProof<F>> {
        let index = self.key_index(&key)?;
        let depth = self.depth();

        let mut siblings = Vec::with_capacity(depth);
        let mut position = index;
        for level in 0..depth {
            siblings.push(vec![self.node(level, position ^ 1).await?]);
            position >>= 1;
        }

        Ok(MerkleProof::new(siblings, index_bits(index, depth)))
    }

    /// Check `proof` against the current root using the stored leaf at `key`.
    ///
    /// `Ok(false)` means the proof does not match; `Err` is a storage or range failure.
    pub async fn verify_merkle_proof(&self, key: F, proof: &MerkleProof<F>) -> Result<bool> {
        let index = self.key_index(&key)?;
        let leaf = self.node(0, index).await?;
        Ok(self.check_proof(index, leaf, proof))
    }

    /// Check `proof` for an explicit leaf value, without touching the store.
    pub fn verify_merkle_proof_for_leaf(&self, key: F, leaf: F, proof: &MerkleProof<F>) -> bool {
        match self.key_index(&key) {
            Ok(index) => self.check_proof(index, leaf, proof),
            Err(_) => false,
        }
    }

    fn check_proof(&self, index: u64, leaf: F, proof: &MerkleProof<F>) -> bool {
        let depth = self.depth();
        proof.depth() == depth
            && proof.path_indices == index_bits(index, depth)
            && proof.verify(&self.hasher, leaf, self.root)
    }

    async fn node(&self, level: usize, index: u64) -> Result<F> {
        Ok(self
            .store
            .get(&NodeKey::node(level, index))
            .await?
            .unwrap_or_else(|| self.zeros.level(level)))
    }

    async fn write(&self, key: &NodeKey, value: F) -> Result<()> {
        if let Err(e) = self.store.set(key, value).await {
            warn!(%key, error = %e, "sparse tree write failed; backend left mid-update");
            return Err(e.into());
        }
        Ok(())
    }

    fn check_index(&self, index: u64) -> Result<()> {
        let depth = self.depth();
        if index >> depth != 0 {
            return Err(TreeError::KeyOutOfRange {
                key: index.to_string(),
                depth,
            });
        }
        Ok(())
    }

    fn key_index(&self, key: &F) -> Result<u64> {
        let depth = self.depth();
        match field::to_u64(key) {
            Some(index) if index >> depth == 0 => Ok(index),
            _ => Err(TreeError::KeyOutOfRange {
                key: field::to_decimal_string(key),
                depth,
            }),
        }
    }
}

fn check_binary<F: PrimeField, H: HashStrategy<F>>(hasher: &H) -> Result<()> {
    if hasher.arity() != 2 {
        return Err(TreeError::ArityMismatch {
            tree: 2,
            hash: hasher.arity(),
        });
    }
    Ok(())
}
