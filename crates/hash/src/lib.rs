//! Field-element hashing for reputation accumulators.
//!
//! This crate provides:
//! - `HashStrategy`: the fixed-arity hash every Merkle tree is built with
//! - `PoseidonHasher`: circom-compatible Poseidon over the BN254 scalar field
//! - `Hashers`: commitment compositions used to derive tree leaves
//! - `field`: canonical parsing and rendering of field elements

pub mod commitment;
pub mod field;
pub mod hasher;
pub mod poseidon;

pub use commitment::Hashers;
pub use field::FieldError;
pub use hasher::{check_arity, FnHasher, HashError, HashStrategy};
pub use poseidon::{PoseidonHasher, SUPPORTED_ARITIES};

use ark_bn254::Fr;

/// Common type aliases
pub type Field = Fr;
