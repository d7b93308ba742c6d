//! Precomputed roots of empty subtrees.
//!
//! `levels[0]` is the empty leaf and `levels[i]` hashes `arity` copies of
//! `levels[i - 1]`, so the root of an all-empty subtree at any level is a
//! lookup rather than a traversal.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use accumulator_hash::HashStrategy;
use ark_ff::PrimeField;
use tracing::{debug, trace};

use crate::error::{Result, TreeError};

/// Deepest tree either structure accepts.
pub const MAX_DEPTH: usize = 32;

/// Reject depths outside `1..=MAX_DEPTH`.
pub fn check_depth(depth: usize) -> Result<()> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(TreeError::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(())
}

/// Zero hashes for levels `0..=depth` of one tree shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZeroHashes<F: PrimeField> {
    levels: Vec<F>,
    arity: usize,
}

impl<F: PrimeField> ZeroHashes<F> {
    pub fn new<H: HashStrategy<F> + ?Sized>(hasher: &H, depth: usize, zero_leaf: F) -> Result<Self> {
        check_depth(depth)?;

        let mut levels = Vec::with_capacity(depth + 1);
        let mut current = zero_leaf;
        levels.push(current);
        for _ in 0..depth {
            current = hasher.hash_repeated(current)?;
            levels.push(current);
        }

        Ok(Self {
            levels,
            arity: hasher.arity(),
        })
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Arity of the hash the table was built with.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Root of an empty subtree whose leaves sit `level` levels below it.
    ///
    /// # Panics
    /// If `level > depth()`.
    pub fn level(&self, level: usize) -> F {
        self.levels[level]
    }

    pub fn zero_leaf(&self) -> F {
        self.levels[0]
    }

    /// Root of the entirely empty tree.
    pub fn root(&self) -> F {
        self.levels[self.depth()]
    }

    pub fn as_slice(&self) -> &[F] {
        &self.levels
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey<F> {
    hasher_id: String,
    arity: usize,
    depth: usize,
    zero_leaf: F,
}

/// Shares zero-hash tables between trees with identical parameters.
///
/// Epoch trees are recreated every epoch with the same shape; the cache lets
/// each new instance skip the `depth` hashes of table construction.
#[derive(Debug, Default)]
pub struct ZeroHashCache<F: PrimeField> {
    tables: Mutex<HashMap<CacheKey<F>, Arc<ZeroHashes<F>>>>,
}

impl<F: PrimeField> ZeroHashCache<F> {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached table for `(hasher, depth, zero_leaf)`, building it on a miss.
    pub fn get_or_build<H: HashStrategy<F> + ?Sized>(
        &self,
        hasher: &H,
        depth: usize,
        zero_leaf: F,
    ) -> Result<Arc<ZeroHashes<F>>> {
        let key = CacheKey {
            hasher_id: hasher.id().to_string(),
            arity: hasher.arity(),
            depth,
            zero_leaf,
        };

        let mut tables = self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(table) = tables.get(&key) {
            trace!(hasher = %key.hasher_id, depth, "zero-hash cache hit");
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(ZeroHashes::new(hasher, depth, zero_leaf)?);
        debug!(hasher = %key.hasher_id, arity = key.arity, depth, "built zero-hash table");
        tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
