use chain_contracts::OpsSopContract;
use chain_core::{Block, BlockHeader, CoreError, GENESIS_PREVIOUS_HASH, Transaction};
use chain_crypto::{Address, KeyPair};
use chain_runtime::{Outcome, RewardEngine, StateProcessor};
use chain_state::{PublicKeyRegistry, WorldState};

use crate::error::{LedgerError, Result};

/// Default gas price (§4.5); configurable per node but this is the value
/// every producer-facing default uses.
pub const DEFAULT_GAS_PRICE: u64 = 1;

/// Treasury's starting balance, funding every reward/penalty disbursement
/// (C10) as well as its own gas costs. Matches the original's genesis pool.
pub const DEFAULT_TREASURY_BALANCE: u64 = 200_000;

/// The root collaborator (§9 REDESIGN FLAGS): owns the chain, mempool,
/// world state, public-key registry and OpsSOP contract as explicit,
/// non-singleton fields. A test constructs a fresh `Node` per scenario
/// instead of resetting module-level statics.
pub struct Node {
    chain: Vec<Block>,
    mempool: Vec<Transaction>,
    world_state: WorldState,
    registry: PublicKeyRegistry,
    ops_sop: OpsSopContract,
    treasury_key: KeyPair,
    gas_price: u64,
    clock: u64,
}

impl Node {
    /// Materialises genesis (§4.6): block 0 with all-zero `previous_hash`,
    /// empty transactions, the Merkle root of the empty list, plus the
    /// Treasury account and its registered public key. The Treasury is
    /// funded to `treasury_balance` so it can actually cover the gas and
    /// principal of every reward/penalty disbursement it sends.
    pub fn new(world_state: WorldState) -> Result<Self> {
        Self::with_treasury_balance(world_state, DEFAULT_TREASURY_BALANCE)
    }

    pub fn with_treasury_balance(world_state: WorldState, treasury_balance: u64) -> Result<Self> {
        let genesis = Block::genesis()?;
        let treasury_key = KeyPair::generate();
        let treasury_address = Address::from_public_key(&treasury_key.public_key_bytes());

        let mut registry = PublicKeyRegistry::new();
        registry.register(treasury_address, treasury_key.public_key());
        let mut treasury_account = world_state.get_or_create(&treasury_address)?;
        treasury_account.balance = treasury_balance;
        world_state.update(&treasury_account)?;

        Ok(Self {
            chain: vec![genesis],
            mempool: Vec::new(),
            world_state,
            registry,
            ops_sop: OpsSopContract::new(),
            treasury_key,
            gas_price: DEFAULT_GAS_PRICE,
            clock: 1,
        })
    }

    pub fn treasury_address(&self) -> Address {
        Address::from_public_key(&self.treasury_key.public_key_bytes())
    }

    pub fn register_public_key(&mut self, address: Address, public_key: chain_crypto::PublicKey) {
        self.registry.register(address, public_key);
    }

    pub fn world_state(&self) -> &WorldState {
        &self.world_state
    }

    pub fn ops_sop(&self) -> &OpsSopContract {
        &self.ops_sop
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn latest_block(&self) -> &Block {
        self.chain.last().expect("genesis is always present")
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.mempool
    }

    /// Monotonic logical clock advanced once per mined block, standing in
    /// for wall-clock time so block timestamps stay deterministic.
    fn tick(&mut self) -> u64 {
        let now = self.clock;
        self.clock += 1;
        now
    }

    /// Mempool admission (§4.6 `add_transaction`): the same checks as the
    /// processor's re-validation step, run without touching world state, so
    /// a rejected submission never debits gas or advances a nonce.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        let Some(sender_account) = self.world_state.get(&tx.sender)? else {
            return Err(LedgerError::Rejected(CoreError::UnknownSigner(tx.sender.to_hex())));
        };

        let Some(public_key) = self.registry.lookup(&tx.sender) else {
            return Err(LedgerError::Rejected(CoreError::UnknownSigner(tx.sender.to_hex())));
        };
        if tx.verify_signature(public_key).is_err() {
            return Err(LedgerError::Rejected(CoreError::InvalidSignature));
        }

        if tx.nonce != sender_account.nonce {
            return Err(LedgerError::Rejected(CoreError::NonceMismatch {
                expected: sender_account.nonce,
                actual: tx.nonce,
            }));
        }

        let minimum = tx.tx_type.minimum_gas_limit();
        if tx.gas_limit < minimum {
            return Err(LedgerError::Rejected(CoreError::GasLimitTooLow {
                tx_type: tx.tx_type.as_str().to_string(),
                actual: tx.gas_limit,
                minimum,
            }));
        }

        let gas_fee = tx.gas_fee();
        if sender_account.balance < gas_fee {
            return Err(LedgerError::Rejected(CoreError::InsufficientBalance {
                available: sender_account.balance,
                required: gas_fee,
            }));
        }

        self.mempool.push(tx);
        Ok(())
    }

    /// Block assembly (§4.6 `mine_block`): snapshot and clear the mempool,
    /// run every transaction through the processor pipeline, keep only the
    /// ones applied, then build and append the header. If a vote pushed the
    /// OpsSOP contract through a consensus decision during this block, the
    /// resulting reward/penalty disbursements are drained into a follow-up
    /// block immediately — bounded to one extra round, never recursive,
    /// since a reward/penalty transaction can never itself trigger
    /// consensus.
    pub fn mine_block(&mut self) -> Result<Option<Block>> {
        let drained: Vec<Transaction> = self.mempool.drain(..).collect();
        if drained.is_empty() {
            return Ok(None);
        }

        let events_before = self.ops_sop.event_count();
        let mut accepted = Vec::with_capacity(drained.len());
        for tx in drained {
            match StateProcessor::process(
                &tx,
                &self.world_state,
                &self.registry,
                &mut self.ops_sop,
                &self.treasury_address(),
            )? {
                Outcome::Applied => accepted.push(tx),
                Outcome::Rejected(reason) => {
                    tracing::warn!(sender = %tx.sender, %reason, "transaction rejected during mining");
                }
            }
        }

        let block = self.assemble_block(accepted)?;

        for event in self.ops_sop.events_since(events_before).to_vec() {
            if event.name != "ConsensusReached" {
                continue;
            }
            let Some(proposal_id) = event.payload.get("proposal_id").and_then(|v| v.as_str()) else {
                continue;
            };
            let passed = event.payload.get("passed").and_then(|v| v.as_bool()).unwrap_or(false);
            let disbursements = RewardEngine::build_disbursements(
                &self.world_state,
                &self.treasury_key,
                proposal_id,
                passed,
                self.gas_price,
            )?;
            for tx in disbursements {
                self.mempool.push(tx);
            }
        }

        if !self.mempool.is_empty() {
            self.mine_reward_round()?;
        }

        Ok(Some(block))
    }

    /// Mines exactly the disbursement transactions queued by the previous
    /// block's consensus outcome. Kept distinct from `mine_block` so that a
    /// Reward/Penalty transaction — which cannot itself reach consensus —
    /// can never recurse into another reward round.
    fn mine_reward_round(&mut self) -> Result<()> {
        let drained: Vec<Transaction> = self.mempool.drain(..).collect();
        let mut accepted = Vec::with_capacity(drained.len());
        for tx in drained {
            match StateProcessor::process(
                &tx,
                &self.world_state,
                &self.registry,
                &mut self.ops_sop,
                &self.treasury_address(),
            )? {
                Outcome::Applied => accepted.push(tx),
                Outcome::Rejected(reason) => {
                    tracing::warn!(sender = %tx.sender, %reason, "disbursement rejected during mining");
                }
            }
        }
        if !accepted.is_empty() {
            self.assemble_block(accepted)?;
        }
        Ok(())
    }

    fn assemble_block(&mut self, transactions: Vec<Transaction>) -> Result<Block> {
        let tip = self.latest_block();
        let header = BlockHeader {
            index: tip.header.index + 1,
            timestamp: self.tick(),
            previous_hash: tip.hash,
            merkle_root: Block::merkle_root_of(&transactions)?,
            nonce: 0,
        };
        let block = Block::assemble(header, transactions)?;
        self.chain.push(block.clone());
        Ok(block)
    }

    /// Chain validation (§4.6 `is_valid_chain`): re-hash every header above
    /// genesis and check `previous_hash` linkage and Merkle root
    /// recomputation.
    pub fn is_valid_chain(&self) -> Result<()> {
        for i in 1..self.chain.len() {
            let current = &self.chain[i];
            let previous = &self.chain[i - 1];

            let recomputed_hash = Block::hash_header(&current.header)?;
            if current.hash != recomputed_hash {
                return Err(LedgerError::Core(CoreError::ChainCorruption(format!(
                    "block {} hash does not match its header",
                    current.header.index
                ))));
            }
            if current.header.previous_hash != previous.hash {
                return Err(LedgerError::Core(CoreError::ChainCorruption(format!(
                    "block {} previous_hash does not link to block {}",
                    current.header.index, previous.header.index
                ))));
            }
            let recomputed_root = Block::merkle_root_of(&current.transactions)?;
            if current.header.merkle_root != recomputed_root {
                return Err(LedgerError::Core(CoreError::ChainCorruption(format!(
                    "block {} merkle root does not match its transactions",
                    current.header.index
                ))));
            }
        }
        if self.chain[0].header.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(LedgerError::Core(CoreError::ChainCorruption(
                "genesis previous_hash is not all-zero".into(),
            )));
        }
        Ok(())
    }
}
