//! Merkle proofs shared by both trees.
//!
//! `siblings[level]` holds the other children of the path node at `level`
//! (`arity - 1` of them, in child order with the path node removed) and
//! `path_indices[level]` is the path node's position among its siblings.
//! Level 0 is the leaf level, so for binary trees the path indices are the
//! bits of the leaf index, least-significant first. Circuits consume proofs in
//! exactly this layout.

use accumulator_hash::{field, HashStrategy};
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof<F: PrimeField> {
    pub siblings: Vec<Vec<F>>,
    pub path_indices: Vec<usize>,
}

impl<F: PrimeField> MerkleProof<F> {
    pub fn new(siblings: Vec<Vec<F>>, path_indices: Vec<usize>) -> Self {
        Self {
            siblings,
            path_indices,
        }
    }

    /// Number of levels the proof spans.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Recompute the root reached by hashing `leaf` up the proof path.
    pub fn compute_root<H: HashStrategy<F> + ?Sized>(&self, hasher: &H, leaf: F) -> Result<F> {
        if self.siblings.len() != self.path_indices.len() {
            return Err(TreeError::MalformedProof(format!(
                "{} sibling levels but {} path indices",
                self.siblings.len(),
                self.path_indices.len()
            )));
        }

        let arity = hasher.arity();
        if arity < 2 {
            return Err(TreeError::InvalidArity(arity));
        }

        let mut node = leaf;
        for (level, (siblings, &position)) in self.siblings.iter().zip(&self.path_indices).enumerate() {
            if siblings.len() + 1 != arity {
                return Err(TreeError::MalformedProof(format!(
                    "level {level} has {} siblings, expected {}",
                    siblings.len(),
                    arity - 1
                )));
            }
            if position >= arity {
                return Err(TreeError::MalformedProof(format!(
                    "level {level} path index {position} exceeds arity {arity}"
                )));
            }

            let mut children = Vec::with_capacity(arity);
            children.extend_from_slice(&siblings[..position]);
            children.push(node);
            children.extend_from_slice(&siblings[position..]);
            node = hasher.hash(&children)?;
        }

        Ok(node)
    }

    /// True iff `leaf` and this path hash to `root`.
    ///
    /// Malformed proofs verify false.
    pub fn verify<H: HashStrategy<F> + ?Sized>(&self, hasher: &H, leaf: F, root: F) -> bool {
        matches!(self.compute_root(hasher, leaf), Ok(computed) if computed == root)
    }

    /// Decimal-string witness layout.
    pub fn to_witness(&self) -> ProofWitness {
        ProofWitness {
            siblings: self
                .siblings
                .iter()
                .map(|level| level.iter().map(field::to_decimal_string).collect())
                .collect(),
            path_indices: self.path_indices.clone(),
        }
    }

    /// Parse a witness, rejecting values that are not canonical field elements.
    pub fn from_witness(witness: &ProofWitness) -> Result<Self> {
        let siblings = witness
            .siblings
            .iter()
            .map(|level| {
                level
                    .iter()
                    .map(|s| field::from_decimal_str(s))
                    .collect::<std::result::Result<Vec<F>, _>>()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self::new(siblings, witness.path_indices.clone()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_witness())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let witness: ProofWitness = serde_json::from_str(json)?;
        Self::from_witness(&witness)
    }
}

/// Proof as circuit input: field elements as base-10 strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofWitness {
    pub siblings: Vec<Vec<String>>,
    pub path_indices: Vec<usize>,
}

/// Path bits of `index` for a binary tree of `depth` levels, LSB first.
///
/// Levels past the width of `u64` read as 0.
pub fn index_bits(index: u64, depth: usize) -> Vec<usize> {
    (0..depth)
        .map(|level| {
            u32::try_from(level)
                .ok()
                .and_then(|shift| index.checked_shr(shift))
                .map_or(0, |bits| (bits & 1) as usize)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use accumulator_hash::{FnHasher, PoseidonHasher};
    use ark_bn254::Fr;
    use ark_ff::Zero;

    #[test]
    fn test_index_bits_lsb_first() {
        assert_eq!(index_bits(5, 4), vec![1, 0, 1, 0]);
        assert_eq!(index_bits(0, 3), vec![0, 0, 0]);
        assert_eq!(index_bits(9, 4), vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_index_bits_past_u64_width() {
        let bits = index_bits(u64::MAX, 70);
        assert_eq!(bits.len(), 70);
        assert!(bits[..64].iter().all(|&bit| bit == 1));
        assert!(bits[64..].iter().all(|&bit| bit == 0));
    }

    #[test]
    fn test_degenerate_hasher_arity_rejected() {
        let nullary = FnHasher::new("const", 0, |_: &[Fr]| Fr::zero());
        let proof = MerkleProof::new(vec![vec![Fr::zero()]], vec![0]);
        assert!(matches!(
            proof.compute_root(&nullary, Fr::zero()),
            Err(TreeError::InvalidArity(0))
        ));
        assert!(!proof.verify(&nullary, Fr::zero(), Fr::zero()));
    }

    #[test]
    fn test_compute_root_inserts_node_at_position() {
        // Concatenation-like hash to make child order observable
        let hasher = FnHasher::new("weighted", 3, |inputs: &[Fr]| {
            inputs[0] + inputs[1] * Fr::from(10u64) + inputs[2] * Fr::from(100u64)
        });
        let proof = MerkleProof::new(vec![vec![Fr::from(1u64), Fr::from(2u64)]], vec![1]);

        // children = [1, leaf, 2]
        let root = proof.compute_root(&hasher, Fr::from(7u64)).unwrap();
        assert_eq!(root, Fr::from(1u64 + 70 + 200));
    }

    #[test]
    fn test_malformed_proofs_verify_false() {
        let hasher = PoseidonHasher::binary();
        let leaf = Fr::from(3u64);

        let missing_index = MerkleProof::new(vec![vec![Fr::zero()]], vec![]);
        assert!(missing_index.compute_root(&hasher, leaf).is_err());
        assert!(!missing_index.verify(&hasher, leaf, Fr::zero()));

        let bad_position = MerkleProof::new(vec![vec![Fr::zero()]], vec![2]);
        assert!(matches!(
            bad_position.compute_root(&hasher, leaf),
            Err(TreeError::MalformedProof(_))
        ));

        let too_many = MerkleProof::new(vec![vec![Fr::zero(), Fr::zero()]], vec![0]);
        assert!(!too_many.verify(&hasher, leaf, Fr::zero()));
    }

    #[test]
    fn test_witness_json_layout() {
        let proof = MerkleProof::new(
            vec![vec![Fr::from(11u64)], vec![Fr::from(22u64)]],
            vec![1, 0],
        );
        let json = proof.to_json().unwrap();
        assert_eq!(json, r#"{"siblings":[["11"],["22"]],"pathIndices":[1,0]}"#);
        assert_eq!(MerkleProof::<Fr>::from_json(&json).unwrap(), proof);
    }

    #[test]
    fn test_witness_rejects_non_canonical() {
        let witness = ProofWitness {
            siblings: vec![vec![
                "21888242871839275222246405745257275088548364400416034343698204186575808495617"
                    .to_string(),
            ]],
            path_indices: vec![0],
        };
        assert!(matches!(
            MerkleProof::<Fr>::from_witness(&witness),
            Err(TreeError::Field(_))
        ));
    }
}
