//! Composite commitments built from fixed-arity Poseidon hashes.
//!
//! These derive the values that end up as tree leaves: identity commitments
//! for the state tree, epoch keys, and the attestation hash chains stored in
//! the epoch tree.

use ark_bn254::Fr;

use crate::hasher::{HashError, HashStrategy};
use crate::poseidon::PoseidonHasher;

/// One Poseidon instance per arity the protocol uses.
#[derive(Clone, Debug)]
pub struct Hashers {
    hash1: PoseidonHasher,
    hash2: PoseidonHasher,
    hash4: PoseidonHasher,
    hash5: PoseidonHasher,
}

impl Hashers {
    pub fn new() -> Result<Self, HashError> {
        Ok(Self {
            hash1: PoseidonHasher::new(1)?,
            hash2: PoseidonHasher::new(2)?,
            hash4: PoseidonHasher::new(4)?,
            hash5: PoseidonHasher::new(5)?,
        })
    }

    /// The binary instance, for building trees that share these parameters.
    pub fn binary(&self) -> &PoseidonHasher {
        &self.hash2
    }

    pub fn hash1(&self, a: Fr) -> Result<Fr, HashError> {
        self.hash1.hash(&[a])
    }

    pub fn hash2(&self, a: Fr, b: Fr) -> Result<Fr, HashError> {
        self.hash2.hash(&[a, b])
    }

    pub fn hash4(&self, inputs: [Fr; 4]) -> Result<Fr, HashError> {
        self.hash4.hash(&inputs)
    }

    pub fn hash5(&self, inputs: [Fr; 5]) -> Result<Fr, HashError> {
        self.hash5.hash(&inputs)
    }

    /// Dispatch on the number of inputs.
    pub fn hash(&self, inputs: &[Fr]) -> Result<Fr, HashError> {
        match inputs.len() {
            1 => self.hash1.hash(inputs),
            2 => self.hash2.hash(inputs),
            4 => self.hash4.hash(inputs),
            5 => self.hash5.hash(inputs),
            n => Err(HashError::UnsupportedArity(n)),
        }
    }

    /// secret = H(nullifier, trapdoor)
    pub fn identity_secret(&self, nullifier: Fr, trapdoor: Fr) -> Result<Fr, HashError> {
        self.hash2(nullifier, trapdoor)
    }

    /// commitment = H(secret)
    pub fn identity_commitment(&self, secret: Fr) -> Result<Fr, HashError> {
        self.hash1(secret)
    }

    /// Epoch key for one attester, epoch and nonce.
    pub fn epoch_key(&self, secret: Fr, attester_id: Fr, epoch: u64, nonce: u64) -> Result<Fr, HashError> {
        self.hash4([secret, attester_id, Fr::from(epoch), Fr::from(nonce)])
    }

    /// Leaf committing a member's reputation data into the state tree.
    pub fn state_tree_leaf(
        &self,
        secret: Fr,
        attester_id: Fr,
        epoch: u64,
        data_commitment: Fr,
        extra: Fr,
    ) -> Result<Fr, HashError> {
        self.hash5([secret, attester_id, Fr::from(epoch), data_commitment, extra])
    }

    /// Fold one more element into an attestation hash chain.
    pub fn hash_chain(&self, chain: Fr, element: Fr) -> Result<Fr, HashError> {
        self.hash2(element, chain)
    }

    /// Fold a sequence of elements, starting from `seed`.
    pub fn hash_chain_fold<I>(&self, seed: Fr, elements: I) -> Result<Fr, HashError>
    where
        I: IntoIterator<Item = Fr>,
    {
        elements
            .into_iter()
            .try_fold(seed, |chain, element| self.hash_chain(chain, element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;

    #[test]
    fn test_identity_commitment_deterministic() {
        let hashers = Hashers::new().unwrap();
        let secret = hashers
            .identity_secret(Fr::from(11u64), Fr::from(22u64))
            .unwrap();
        let c1 = hashers.identity_commitment(secret).unwrap();
        let c2 = hashers.identity_commitment(secret).unwrap();
        assert_eq!(c1, c2);
        assert_ne!(c1, secret);
    }

    #[test]
    fn test_hash_dispatch_matches_named() {
        let hashers = Hashers::new().unwrap();
        let inputs = [Fr::from(1u64), Fr::from(2u64), Fr::from(3u64), Fr::from(4u64)];
        assert_eq!(hashers.hash(&inputs).unwrap(), hashers.hash4(inputs).unwrap());
        assert!(matches!(
            hashers.hash(&inputs[..3]),
            Err(HashError::UnsupportedArity(3))
        ));
        assert!(hashers.hash(&[]).is_err());
    }

    #[test]
    fn test_hash_chain_fold() {
        let hashers = Hashers::new().unwrap();
        let elements = [Fr::from(5u64), Fr::from(6u64)];

        let step1 = hashers.hash_chain(Fr::zero(), elements[0]).unwrap();
        let step2 = hashers.hash_chain(step1, elements[1]).unwrap();

        assert_eq!(hashers.hash_chain_fold(Fr::zero(), elements).unwrap(), step2);
        assert_eq!(
            hashers.hash_chain_fold(Fr::zero(), std::iter::empty()).unwrap(),
            Fr::zero()
        );
    }

    #[test]
    fn test_epoch_keys_differ_by_nonce() {
        let hashers = Hashers::new().unwrap();
        let secret = Fr::from(99u64);
        let attester = Fr::from(1u64);
        let k0 = hashers.epoch_key(secret, attester, 3, 0).unwrap();
        let k1 = hashers.epoch_key(secret, attester, 3, 1).unwrap();
        assert_ne!(k0, k1);
    }
}
