//! Merkle-tree accumulators for an anonymous reputation protocol.
//!
//! This crate provides:
//! - `IncrementalMerkleTree`: dense, fixed-arity append/update tree held in memory
//! - `SparseMerkleTree`: binary key-addressed tree persisted through a `NodeStore`
//! - `ZeroHashes` / `ZeroHashCache`: empty-subtree roots per level
//! - `MerkleProof`: sibling paths plus the circuit witness encoding
//!
//! Both trees are generic over the field and take their hash as a
//! [`HashStrategy`] at construction.

pub mod config;
pub mod error;
pub mod incremental;
pub mod proof;
pub mod sparse;
pub mod store;
pub mod zero;

pub use accumulator_hash::{HashStrategy, PoseidonHasher};
pub use config::TreeConfig;
pub use error::{Result, TreeError};
pub use incremental::IncrementalMerkleTree;
pub use proof::{index_bits, MerkleProof, ProofWitness};
pub use sparse::SparseMerkleTree;
pub use store::{MemoryStore, NodeKey, NodeStore, StoreError};
pub use zero::{ZeroHashCache, ZeroHashes, MAX_DEPTH};

use ark_bn254::Fr;

/// Incremental tree over BN254 with binary Poseidon.
pub type PoseidonIncrementalTree = IncrementalMerkleTree<Fr, PoseidonHasher>;

/// Sparse tree over BN254 with binary Poseidon and the in-memory backend.
pub type PoseidonSparseTree = SparseMerkleTree<Fr, PoseidonHasher, MemoryStore<Fr>>;
