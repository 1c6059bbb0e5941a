use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};
use crate::hash::{hash_pair, Hash256};

/// Builds on `merkle_root` (§4.1) to support inclusion proofs for the Read
/// API (§6): "produce a Merkle inclusion proof for (block_index,
/// tx_index)". Stores every level so a proof can be read back out instead
/// of recomputed per request.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash256>>,
}

/// A leaf's sibling path from leaf to root, sufficient to recompute the
/// root and compare it against the one the caller already trusts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub leaf_hash: Hash256,
    pub siblings: Vec<Hash256>,
    pub root: Hash256,
}

impl MerkleTree {
    pub fn new(leaves: Vec<Hash256>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyMerkleTree);
        }

        let mut levels = vec![leaves];
        while levels.last().unwrap().len() > 1 {
            let current = levels.last().unwrap();
            let mut next = Vec::with_capacity((current.len() + 1) / 2);
            for pair in current.chunks(2) {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                next.push(hash_pair(&left, &right));
            }
            levels.push(next);
        }
        Ok(Self { levels })
    }

    pub fn root(&self) -> Hash256 {
        *self.levels.last().unwrap().last().unwrap()
    }

    pub fn leaves(&self) -> &[Hash256] {
        &self.levels[0]
    }

    pub fn generate_proof(&self, leaf_index: usize) -> Result<MerkleProof> {
        if leaf_index >= self.leaves().len() {
            return Err(CryptoError::InvalidMerkleProof);
        }

        let mut siblings = Vec::new();
        let mut index = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = if index % 2 == 0 {
                if index + 1 < level.len() {
                    index + 1
                } else {
                    index
                }
            } else {
                index - 1
            };
            siblings.push(level[sibling_index]);
            index /= 2;
        }

        Ok(MerkleProof {
            leaf_index,
            leaf_hash: self.leaves()[leaf_index],
            siblings,
            root: self.root(),
        })
    }

    pub fn verify_proof(proof: &MerkleProof) -> bool {
        let mut current = proof.leaf_hash;
        let mut index = proof.leaf_index;
        for sibling in &proof.siblings {
            current = if index % 2 == 0 {
                hash_pair(&current, sibling)
            } else {
                hash_pair(sibling, &current)
            };
            index /= 2;
        }
        current == proof.root
    }
}
