//! The pluggable hash used by every tree.
//!
//! A strategy is a pure function of a fixed number of field elements. Trees
//! receive one at construction and never swap it afterwards.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use ark_ff::PrimeField;
use thiserror::Error;

/// Errors raised by hash strategies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("Hash expects {expected} inputs, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("Unsupported hash arity: {0}")]
    UnsupportedArity(usize),
    #[error("Poseidon permutation failed: {0}")]
    Poseidon(String),
}

/// A deterministic hash of `arity()` field elements into one.
pub trait HashStrategy<F: PrimeField>: Send + Sync {
    /// Number of inputs consumed by one application.
    fn arity(&self) -> usize;

    /// Stable identifier, used to key cached zero-hash tables.
    fn id(&self) -> &str;

    /// Hash exactly `arity()` inputs.
    fn hash(&self, inputs: &[F]) -> Result<F, HashError>;

    /// Hash a left/right pair. Only valid for binary strategies.
    fn hash_pair(&self, left: F, right: F) -> Result<F, HashError> {
        self.hash(&[left, right])
    }

    /// Hash `arity()` copies of `value` (the parent of an all-empty node).
    fn hash_repeated(&self, value: F) -> Result<F, HashError> {
        self.hash(&vec![value; self.arity()])
    }
}

/// Fail with [`HashError::ArityMismatch`] unless `inputs.len() == expected`.
pub fn check_arity<F>(expected: usize, inputs: &[F]) -> Result<(), HashError> {
    if inputs.len() != expected {
        return Err(HashError::ArityMismatch {
            expected,
            actual: inputs.len(),
        });
    }
    Ok(())
}

impl<F: PrimeField, H: HashStrategy<F> + ?Sized> HashStrategy<F> for Arc<H> {
    fn arity(&self) -> usize {
        (**self).arity()
    }

    fn id(&self) -> &str {
        (**self).id()
    }

    fn hash(&self, inputs: &[F]) -> Result<F, HashError> {
        (**self).hash(inputs)
    }
}

impl<F: PrimeField, H: HashStrategy<F> + ?Sized> HashStrategy<F> for &H {
    fn arity(&self) -> usize {
        (**self).arity()
    }

    fn id(&self) -> &str {
        (**self).id()
    }

    fn hash(&self, inputs: &[F]) -> Result<F, HashError> {
        (**self).hash(inputs)
    }
}

/// A strategy backed by a plain function or closure.
///
/// The closure only ever sees slices of the declared arity.
pub struct FnHasher<F, Fun> {
    arity: usize,
    id: String,
    func: Fun,
    _field: PhantomData<fn() -> F>,
}

impl<F, Fun> FnHasher<F, Fun>
where
    F: PrimeField,
    Fun: Fn(&[F]) -> F + Send + Sync,
{
    pub fn new(id: impl Into<String>, arity: usize, func: Fun) -> Self {
        Self {
            arity,
            id: id.into(),
            func,
            _field: PhantomData,
        }
    }
}

impl<F, Fun> HashStrategy<F> for FnHasher<F, Fun>
where
    F: PrimeField,
    Fun: Fn(&[F]) -> F + Send + Sync,
{
    fn arity(&self) -> usize {
        self.arity
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn hash(&self, inputs: &[F]) -> Result<F, HashError> {
        check_arity(self.arity, inputs)?;
        Ok((self.func)(inputs))
    }
}

impl<F, Fun> fmt::Debug for FnHasher<F, Fun> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHasher")
            .field("id", &self.id)
            .field("arity", &self.arity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    fn sum_hasher(arity: usize) -> FnHasher<Fr, impl Fn(&[Fr]) -> Fr + Send + Sync> {
        FnHasher::new("sum", arity, |inputs: &[Fr]| inputs.iter().copied().sum())
    }

    #[test]
    fn test_fn_hasher_arity_enforced() {
        let hasher = sum_hasher(2);
        assert_eq!(
            hasher.hash(&[Fr::from(1u64), Fr::from(2u64)]).unwrap(),
            Fr::from(3u64)
        );

        let err = hasher.hash(&[Fr::from(1u64)]).unwrap_err();
        assert_eq!(
            err,
            HashError::ArityMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(hasher.hash(&[Fr::from(1u64); 3]).is_err());
    }

    #[test]
    fn test_hash_repeated_uses_arity() {
        let hasher = sum_hasher(4);
        assert_eq!(
            hasher.hash_repeated(Fr::from(5u64)).unwrap(),
            Fr::from(20u64)
        );
    }

    #[test]
    fn test_shared_strategies_delegate() {
        let hasher = Arc::new(sum_hasher(2));
        assert_eq!(HashStrategy::<Fr>::arity(&hasher), 2);
        assert_eq!(HashStrategy::<Fr>::id(&hasher), "sum");
        assert_eq!(
            (&hasher).hash_pair(Fr::from(2u64), Fr::from(2u64)).unwrap(),
            Fr::from(4u64)
        );
    }
}
