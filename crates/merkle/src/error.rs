//! Error taxonomy shared by both trees.

use accumulator_hash::{FieldError, HashError};
use thiserror::Error;

use crate::store::StoreError;

/// Errors from tree construction, mutation and proof handling.
///
/// A proof that simply does not match the current root is not an error: the
/// verify functions return `false` (or `Ok(false)`) for that case.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Invalid tree depth {depth}: must be between 1 and {max}")]
    InvalidDepth { depth: usize, max: usize },
    #[error("Invalid tree arity {0}: must be at least 2")]
    InvalidArity(usize),
    #[error("Hash arity {hash} does not match tree arity {tree}")]
    ArityMismatch { tree: usize, hash: usize },
    #[error("Tree is full ({capacity} leaves)")]
    TreeFull { capacity: u128 },
    #[error("Leaf index {index} out of range (tree has {len} leaves)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Key {key} out of range for a tree of depth {depth}")]
    KeyOutOfRange { key: String, depth: usize },
    #[error("Malformed proof: {0}")]
    MalformedProof(String),
    #[error("Encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Field(#[from] FieldError),
}

pub type Result<T> = std::result::Result<T, TreeError>;
