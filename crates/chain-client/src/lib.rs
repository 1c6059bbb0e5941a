pub mod error;

use std::sync::{Arc, Mutex};

use chain_contracts::{Event, ProposalRecord};
use chain_core::{Account, Block, SopState, Transaction, TxData};
use chain_crypto::{Address, Hash256, KeyPair, MerkleProof, MerkleTree};
use chain_ledger::{Node, DEFAULT_GAS_PRICE};

pub use error::{ClientError, Result};

/// Mirrors `get_blockchain_info()` (present in the original client facade,
/// dropped from the distilled module list but kept here as a convenience
/// read method).
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlockchainInfo {
    pub block_height: u64,
    pub pending_transactions: usize,
    pub latest_block_hash: String,
    pub chain_id: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ConsensusResult {
    pub passed: bool,
    pub votes_for: f64,
    pub votes_against: f64,
    pub votes_abstain: f64,
}

/// Producer-facing façade (§4.7): composes correctly-formed, signed
/// transactions and surfaces chain state, with no business validation of
/// its own — admission and execution rules live entirely in `chain-ledger`
/// and `chain-runtime`. Holds the same `Node` the RPC server reads from, so
/// an agent using `ChainClient` and a dashboard hitting `chain-rpc` see a
/// consistent view.
#[derive(Clone)]
pub struct ChainClient {
    node: Arc<Mutex<Node>>,
}

impl ChainClient {
    pub fn new(node: Arc<Mutex<Node>>) -> Self {
        Self { node }
    }

    pub fn get_account(&self, address: &Address) -> Result<Option<Account>> {
        let node = self.node.lock().unwrap();
        Ok(node.world_state().get(address)?)
    }

    pub fn get_balance(&self, address: &Address) -> Result<u64> {
        Ok(self.get_account(address)?.map(|a| a.balance).unwrap_or(0))
    }

    pub fn get_stake(&self, address: &Address) -> Result<u64> {
        Ok(self.get_account(address)?.map(|a| a.stake).unwrap_or(0))
    }

    pub fn get_block_height(&self) -> u64 {
        self.node.lock().unwrap().chain().len() as u64
    }

    pub fn get_latest_block(&self) -> Block {
        self.node.lock().unwrap().latest_block().clone()
    }

    pub fn get_block(&self, index: u64) -> Option<Block> {
        self.node.lock().unwrap().chain().get(index as usize).cloned()
    }

    pub fn get_pending_transactions(&self) -> Vec<Transaction> {
        self.node.lock().unwrap().pending_transactions().to_vec()
    }

    /// Lists blocks in index order, for a paged read endpoint.
    pub fn list_blocks(&self, offset: usize, limit: usize) -> Vec<Block> {
        self.node
            .lock()
            .unwrap()
            .chain()
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Scans the chain for a transaction by its digest, matching the
    /// original client's "fetch transaction by hash" (a chain scan, since
    /// there is no separate transaction index).
    pub fn get_transaction(&self, hash: &Hash256) -> Result<Option<(u64, Transaction)>> {
        let node = self.node.lock().unwrap();
        for block in node.chain() {
            for tx in &block.transactions {
                if tx.digest()? == *hash {
                    return Ok(Some((block.header.index, tx.clone())));
                }
            }
        }
        Ok(None)
    }

    /// Builds the Merkle inclusion proof for transaction `tx_index` of
    /// block `block_index`.
    pub fn get_merkle_proof(&self, block_index: u64, tx_index: usize) -> Result<Option<MerkleProof>> {
        let node = self.node.lock().unwrap();
        let Some(block) = node.chain().get(block_index as usize) else {
            return Ok(None);
        };
        if block.transactions.is_empty() {
            return Ok(None);
        }
        let leaves = block
            .transactions
            .iter()
            .map(|tx| tx.digest())
            .collect::<chain_core::Result<Vec<_>>>()?;
        let tree = MerkleTree::new(leaves).map_err(chain_core::CoreError::Crypto)?;
        match tree.generate_proof(tx_index) {
            Ok(proof) => Ok(Some(proof)),
            Err(chain_crypto::CryptoError::InvalidMerkleProof) => Ok(None),
            Err(other) => Err(chain_core::CoreError::Crypto(other).into()),
        }
    }

    /// Reads the sender's current nonce and signs a transaction with
    /// `private_key`, defaulting `gas_price` to 1 and `gas_limit` to the
    /// tx type's minimum when not supplied.
    pub fn create_transaction(
        &self,
        sender: Address,
        private_key: &KeyPair,
        data: TxData,
        gas_price: Option<u64>,
        gas_limit: Option<u64>,
        timestamp: u64,
    ) -> Result<Transaction> {
        let account = self
            .get_account(&sender)?
            .ok_or_else(|| ClientError::UnknownAccount(sender.to_hex()))?;

        let gas_limit = gas_limit.unwrap_or_else(|| data.tx_type().minimum_gas_limit());
        let mut tx = Transaction::new_unsigned(
            sender,
            account.nonce,
            gas_price.unwrap_or(DEFAULT_GAS_PRICE),
            gas_limit,
            data,
            timestamp,
        );
        tx.sign(private_key)?;
        Ok(tx)
    }

    pub fn send_transaction(&self, tx: Transaction) -> Result<()> {
        let mut node = self.node.lock().unwrap();
        node.add_transaction(tx)?;
        Ok(())
    }

    /// Submits and immediately mines, for test/development flows where an
    /// agent wants a synchronous accept/reject answer.
    pub fn send_and_mine(&self, tx: Transaction) -> Result<Option<Block>> {
        let mut node = self.node.lock().unwrap();
        node.add_transaction(tx)?;
        Ok(node.mine_block()?)
    }

    pub fn get_events(&self, name: Option<&str>, limit: usize) -> Vec<Event> {
        let node = self.node.lock().unwrap();
        let events = node.ops_sop().events(limit);
        events
            .into_iter()
            .filter(|e| name.map(|n| e.name == n).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Finds the most recent `ConsensusReached` event for `proposal_id` and
    /// pairs it with the proposal's recorded vote tally.
    pub fn check_consensus(&self, proposal_id: &str) -> Result<Option<ConsensusResult>> {
        let node = self.node.lock().unwrap();
        let consensus_event = node
            .ops_sop()
            .events(usize::MAX)
            .into_iter()
            .rev()
            .find(|e| e.name == "ConsensusReached" && e.payload.get("proposal_id").and_then(|v| v.as_str()) == Some(proposal_id));

        let Some(event) = consensus_event else {
            return Ok(None);
        };
        let passed = event.payload.get("passed").and_then(|v| v.as_bool()).unwrap_or(false);

        let votes = node
            .world_state()
            .find_proposal(proposal_id)?
            .map(|(_, proposal)| proposal.votes)
            .unwrap_or_default();

        Ok(Some(ConsensusResult {
            passed,
            votes_for: votes.for_,
            votes_against: votes.against,
            votes_abstain: votes.abstain,
        }))
    }

    pub fn get_sop_state(&self) -> SopState {
        self.node.lock().unwrap().ops_sop().current_state()
    }

    pub fn get_current_proposal(&self) -> Option<ProposalRecord> {
        self.node.lock().unwrap().ops_sop().current_proposal().cloned()
    }

    pub fn get_treasury_account(&self) -> Result<Option<Account>> {
        let node = self.node.lock().unwrap();
        let treasury = node.treasury_address();
        Ok(node.world_state().get(&treasury)?)
    }

    pub fn get_blockchain_info(&self) -> BlockchainInfo {
        let node = self.node.lock().unwrap();
        BlockchainInfo {
            block_height: node.chain().len() as u64,
            pending_transactions: node.pending_transactions().len(),
            latest_block_hash: node.latest_block().hash.to_hex(),
            chain_id: "sop-chain".to_string(),
        }
    }
}
