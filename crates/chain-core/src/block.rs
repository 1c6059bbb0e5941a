use serde::{Deserialize, Serialize};

use chain_crypto::{canonical_digest, merkle_root, Hash256};

use crate::error::Result;
use crate::transaction::Transaction;

/// 64 zero bytes as hex — the genesis block's `previous_hash`.
pub const GENESIS_PREVIOUS_HASH: Hash256 = Hash256::zero();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub index: u64,
    pub timestamp: u64,
    pub previous_hash: Hash256,
    pub merkle_root: Hash256,
    pub nonce: u64,
}

/// Header + ordered transaction list + cached block hash. The hash is
/// computed once at assembly time (`Block::assemble`) and trusted
/// thereafter; `chain-ledger`'s validation re-derives it to detect
/// corruption rather than recomputing it on every access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub hash: Hash256,
}

impl Block {
    /// Computes the Merkle root over `sha256(canonical(tx))` leaves, per §3.
    pub fn merkle_root_of(transactions: &[Transaction]) -> Result<Hash256> {
        let mut leaves = Vec::with_capacity(transactions.len());
        for tx in transactions {
            leaves.push(tx.digest()?);
        }
        Ok(merkle_root(&leaves))
    }

    /// SHA-256 of the canonicalized header — the block hash.
    pub fn hash_header(header: &BlockHeader) -> Result<Hash256> {
        Ok(canonical_digest(header)?)
    }

    /// Builds a block from a header and its transactions, computing and
    /// caching the block hash. Does not itself validate `merkle_root` or
    /// `previous_hash` linkage — that is `chain-ledger`'s job when the
    /// block joins the chain.
    pub fn assemble(header: BlockHeader, transactions: Vec<Transaction>) -> Result<Self> {
        let hash = Self::hash_header(&header)?;
        Ok(Self {
            header,
            transactions,
            hash,
        })
    }

    pub fn genesis() -> Result<Self> {
        let header = BlockHeader {
            index: 0,
            timestamp: 0,
            previous_hash: GENESIS_PREVIOUS_HASH,
            merkle_root: Self::merkle_root_of(&[])?,
            nonce: 0,
        };
        Self::assemble(header, vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_zero_previous_hash_and_empty_merkle_root() {
        let genesis = Block::genesis().unwrap();
        assert_eq!(genesis.header.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(genesis.header.merkle_root, chain_crypto::sha256(b""));
        assert_eq!(genesis.header.index, 0);
    }

    #[test]
    fn assembled_hash_matches_recomputation() {
        let genesis = Block::genesis().unwrap();
        assert_eq!(genesis.hash, Block::hash_header(&genesis.header).unwrap());
    }
}
