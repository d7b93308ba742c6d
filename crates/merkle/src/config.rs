//! Tree shape configuration.

use accumulator_hash::field;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::zero::check_depth;

/// Shape of one accumulator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Number of levels above the leaves
    pub depth: usize,
    /// Children per node
    pub arity: usize,
    /// Empty-leaf value as a base-10 string
    pub zero_leaf: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: 17,
            arity: 2,
            zero_leaf: "0".to_string(),
        }
    }
}

impl TreeConfig {
    /// Global state tree holding identity/state commitments.
    pub fn state_tree() -> Self {
        Self::default()
    }

    /// Per-epoch sparse tree keyed by epoch key.
    pub fn epoch_tree() -> Self {
        Self {
            depth: 32,
            ..Self::default()
        }
    }

    /// Tree of historical state/epoch root pairs.
    pub fn history_tree() -> Self {
        Self::default()
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_zero_leaf(mut self, zero_leaf: impl Into<String>) -> Self {
        self.zero_leaf = zero_leaf.into();
        self
    }

    /// Check depth and arity. The zero leaf is checked when parsed.
    pub fn validate(&self) -> Result<()> {
        check_depth(self.depth)?;
        if self.arity < 2 {
            return Err(TreeError::InvalidArity(self.arity));
        }
        Ok(())
    }

    pub fn zero_leaf_value<F: PrimeField>(&self) -> Result<F> {
        Ok(field::from_decimal_str(&self.zero_leaf)?)
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
