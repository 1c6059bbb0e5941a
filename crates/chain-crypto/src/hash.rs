use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CryptoError, Result};

/// A 32-byte SHA-256 digest, carried as raw bytes internally and converted
/// to lowercase hex only at the boundary (wire format, logs).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Hash256([u8; 32]);

impl Hash256 {
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidHashLength {
                expected: 32,
                actual: v.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Hash256> for String {
    fn from(h: Hash256) -> Self {
        h.to_hex()
    }
}

impl TryFrom<String> for Hash256 {
    type Error = CryptoError;

    fn try_from(s: String) -> Result<Self> {
        Hash256::from_hex(&s)
    }
}

/// SHA-256 of `data`, the sole hash primitive used throughout the chain.
pub fn sha256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Hash256(bytes)
}

/// Merkle-pair combination: the lowercase-hex encodings of `left` and
/// `right` are concatenated as strings, then re-hashed (§3) — not the raw
/// digest bytes. Leaf duplication for odd levels is the caller's
/// responsibility.
pub fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
    let combined = format!("{}{}", left.to_hex(), right.to_hex());
    sha256(combined.as_bytes())
}

/// Computes the Merkle root over already-hashed leaves, duplicating the
/// last leaf at each level when the count is odd. The root of an empty
/// leaf list is `sha256("")`.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return sha256(b"");
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_is_hash_of_empty_string() {
        assert_eq!(merkle_root(&[]), sha256(b""));
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let leaf = sha256(b"a");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn odd_leaf_count_duplicates_last() {
        let a = sha256(b"a");
        let b = sha256(b"b");
        let c = sha256(b"c");
        let with_dup = merkle_root(&[a, b, c, c]);
        let odd = merkle_root(&[a, b, c]);
        assert_eq!(with_dup, odd);
    }

    #[test]
    fn hex_roundtrip() {
        let h = sha256(b"roundtrip");
        let hex = h.to_hex();
        assert_eq!(Hash256::from_hex(&hex).unwrap(), h);
    }
}
