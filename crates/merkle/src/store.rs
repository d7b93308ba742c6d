//! Persistence capability for the sparse tree.
//!
//! The tree reads and writes individual nodes through [`NodeStore`]; the
//! caller owns the backend and decides its lifecycle. Only nodes on written
//! paths are ever stored.

use std::collections::HashMap;
use std::fmt;

use ark_ff::PrimeField;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Address of one stored record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKey {
    /// Node `index` at `level`, counting levels up from the leaves (level 0).
    Node { level: u32, index: u64 },
    /// Number of distinct keys ever written to the tree.
    LeafCount,
}

impl NodeKey {
    pub fn node(level: usize, index: u64) -> Self {
        NodeKey::Node {
            level: level as u32,
            index,
        }
    }

    pub fn leaf(index: u64) -> Self {
        Self::node(0, index)
    }

    /// The root of a tree of the given depth.
    pub fn root(depth: usize) -> Self {
        Self::node(depth, 0)
    }

    /// Fixed-width encoding for byte-keyed backends.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            NodeKey::Node { level, index } => {
                let mut bytes = Vec::with_capacity(13);
                bytes.push(0);
                bytes.extend_from_slice(&level.to_be_bytes());
                bytes.extend_from_slice(&index.to_be_bytes());
                bytes
            }
            NodeKey::LeafCount => vec![1],
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Node { level, index } => write!(f, "{level}-{index}"),
            NodeKey::LeafCount => write!(f, "leaf-count"),
        }
    }
}

/// Errors surfaced by storage backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(String),
    #[error("Corrupted record at {key}: {reason}")]
    Corrupted { key: NodeKey, reason: String },
}

/// Async key-value access to tree nodes.
///
/// Implementations may fail transiently or permanently; the tree passes
/// failures through unchanged and never retries.
#[async_trait]
pub trait NodeStore<F: PrimeField>: Send + Sync {
    async fn get(&self, key: &NodeKey) -> Result<Option<F>, StoreError>;
    async fn set(&self, key: &NodeKey, value: F) -> Result<(), StoreError>;
}

/// In-process backend.
#[derive(Debug, Default)]
pub struct MemoryStore<F: PrimeField> {
    nodes: RwLock<HashMap<NodeKey, F>>,
}

impl<F: PrimeField> MemoryStore<F> {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild a store from previously captured records.
    pub fn from_snapshot(entries: impl IntoIterator<Item = (NodeKey, F)>) -> Self {
        Self {
            nodes: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }

    /// All records, sorted by key.
    pub async fn snapshot(&self) -> Vec<(NodeKey, F)> {
        let mut entries: Vec<_> = self
            .nodes
            .read()
            .await
            .iter()
            .map(|(key, value)| (*key, *value))
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }
}

#[async_trait]
impl<F: PrimeField> NodeStore<F> for MemoryStore<F> {
    async fn get(&self, key: &NodeKey) -> Result<Option<F>, StoreError> {
        Ok(self.nodes.read().await.get(key).copied())
    }

    async fn set(&self, key: &NodeKey, value: F) -> Result<(), StoreError> {
        self.nodes.write().await.insert(*key, value);
        Ok(())
    }
}
