//! Canonical encodings of field elements.
//!
//! Arithmetic on `F` is always reduced by the field type itself. The parsers in
//! this module accept only integers that are already below the modulus: an
//! encoding of `p + 1` is rejected rather than silently reduced to `1`, which
//! matches how circuits treat public inputs.

use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use num_bigint::BigUint;
use num_traits::Num;
use thiserror::Error;

/// Errors while decoding field elements
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Invalid field element encoding: {0}")]
    Parse(String),
    #[error("Value {0} is not below the field modulus")]
    NonCanonical(String),
    #[error("Field element serialization failed: {0}")]
    Encoding(String),
}

/// Convert an unsigned integer to a field element, rejecting values `>= p`.
pub fn from_biguint<F: PrimeField>(value: &BigUint) -> Result<F, FieldError> {
    let modulus: BigUint = F::MODULUS.into();
    if *value >= modulus {
        return Err(FieldError::NonCanonical(value.to_string()));
    }
    Ok(F::from(value.clone()))
}

/// Parse a base-10 string.
pub fn from_decimal_str<F: PrimeField>(s: &str) -> Result<F, FieldError> {
    let value = BigUint::from_str_radix(s.trim(), 10)
        .map_err(|e| FieldError::Parse(format!("{s:?}: {e}")))?;
    from_biguint(&value)
}

/// Parse a hex string with or without a `0x` prefix.
pub fn from_hex_str<F: PrimeField>(s: &str) -> Result<F, FieldError> {
    let digits = s.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded).map_err(|e| FieldError::Parse(format!("{s:?}: {e}")))?;
    from_be_bytes_canonical(&bytes)
}

/// Decode big-endian bytes, rejecting values `>= p`.
pub fn from_be_bytes_canonical<F: PrimeField>(bytes: &[u8]) -> Result<F, FieldError> {
    from_biguint(&BigUint::from_bytes_be(bytes))
}

/// Canonical base-10 rendering (the format snarkjs witnesses use).
pub fn to_decimal_string<F: PrimeField>(value: &F) -> String {
    let value: BigUint = (*value).into();
    value.to_string()
}

/// Big-endian hex rendering with a `0x` prefix.
pub fn to_hex<F: PrimeField>(value: &F) -> String {
    format!("0x{}", hex::encode(value.into_bigint().to_bytes_be()))
}

/// Arkworks compressed encoding.
pub fn to_bytes<F: PrimeField>(value: &F) -> Result<Vec<u8>, FieldError> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value
        .serialize_compressed(&mut bytes)
        .map_err(|e| FieldError::Encoding(e.to_string()))?;
    Ok(bytes)
}

/// Inverse of [`to_bytes`]. Non-canonical encodings fail to deserialize.
pub fn from_bytes<F: PrimeField>(bytes: &[u8]) -> Result<F, FieldError> {
    F::deserialize_compressed(bytes).map_err(|e| FieldError::Encoding(e.to_string()))
}

/// Returns the element as a `u64` if it fits.
pub fn to_u64<F: PrimeField>(value: &F) -> Option<u64> {
    let bigint = value.into_bigint();
    let limbs = bigint.as_ref();
    if limbs.iter().skip(1).all(|limb| *limb == 0) {
        limbs.first().copied()
    } else {
        None
    }
}
