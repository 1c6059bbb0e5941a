use chain_contracts::{ContractError, GovernanceContract, OpsSopContract, TokenContract};
use chain_core::{CoreError, Proposal, Transaction, TxData};
use chain_crypto::Address;
use chain_state::{PublicKeyRegistry, WorldState};

use crate::error::Result;

/// Outcome of running one transaction through the pipeline. `Rejected`
/// carries the same error taxonomy as mempool admission (§7) — the caller
/// decides whether to log-and-drop (mining) or return synchronously to the
/// submitter (admission).
#[derive(Debug)]
pub enum Outcome {
    Applied,
    Rejected(CoreError),
}

/// Dispatches a validated transaction to its contract handler and applies
/// effects (§4.5, §4.6). Drives gas debit/refund and nonce bookkeeping so
/// individual contracts never touch gas accounting.
pub struct StateProcessor;

impl StateProcessor {
    pub fn process(
        tx: &Transaction,
        world_state: &WorldState,
        registry: &PublicKeyRegistry,
        ops_sop: &mut OpsSopContract,
        treasury: &Address,
    ) -> Result<Outcome> {
        let Some(mut sender_account) = world_state.get(&tx.sender)? else {
            return Ok(Outcome::Rejected(CoreError::UnknownSigner(tx.sender.to_hex())));
        };

        let Some(public_key) = registry.lookup(&tx.sender) else {
            return Ok(Outcome::Rejected(CoreError::UnknownSigner(tx.sender.to_hex())));
        };
        if tx.verify_signature(public_key).is_err() {
            return Ok(Outcome::Rejected(CoreError::InvalidSignature));
        }

        if tx.nonce != sender_account.nonce {
            return Ok(Outcome::Rejected(CoreError::NonceMismatch {
                expected: sender_account.nonce,
                actual: tx.nonce,
            }));
        }

        let minimum = tx.tx_type.minimum_gas_limit();
        if tx.gas_limit < minimum {
            return Ok(Outcome::Rejected(CoreError::GasLimitTooLow {
                tx_type: tx.tx_type.as_str().to_string(),
                actual: tx.gas_limit,
                minimum,
            }));
        }

        let gas_fee = tx.gas_fee();
        if sender_account.balance < gas_fee {
            return Ok(Outcome::Rejected(CoreError::InsufficientBalance {
                available: sender_account.balance,
                required: gas_fee,
            }));
        }

        sender_account.balance -= gas_fee;
        world_state.update(&sender_account)?;

        let dispatch_result = Self::dispatch(tx, world_state, ops_sop, treasury);

        match dispatch_result {
            Ok(()) => {
                let mut sender_account = world_state
                    .get(&tx.sender)?
                    .expect("sender account exists: gas debit wrote it above");
                sender_account.nonce += 1;
                world_state.update(&sender_account)?;
                Ok(Outcome::Applied)
            }
            Err(err) => {
                sender_account.balance += gas_fee;
                world_state.update(&sender_account)?;
                Ok(Outcome::Rejected(CoreError::ContractPreconditionFailed(
                    err.to_string(),
                )))
            }
        }
    }

    fn dispatch(
        tx: &Transaction,
        world_state: &WorldState,
        ops_sop: &mut OpsSopContract,
        treasury: &Address,
    ) -> chain_contracts::Result<()> {
        match &tx.data {
            TxData::Transfer { to, amount } => {
                TokenContract::transfer(world_state, &tx.sender, to, *amount)
            }
            TxData::Stake { amount } => TokenContract::stake(world_state, &tx.sender, *amount),
            TxData::Slash { target, amount } => {
                if tx.sender != *treasury {
                    return Err(ContractError::Unauthorized {
                        sender: tx.sender.to_hex(),
                        action: "slash a staked account".to_string(),
                    });
                }
                TokenContract::slash(world_state, target, *amount)
            }
            TxData::Reward {
                target,
                amount,
                reputation,
                memo,
            } => {
                tracing::debug!(%memo, "reward disbursement");
                TokenContract::reward(world_state, &tx.sender, target, *amount, *reputation)
            }
            TxData::Penalty {
                target,
                amount,
                reputation,
                memo,
            } => {
                tracing::debug!(%memo, "penalty disbursement");
                TokenContract::penalty(world_state, &tx.sender, target, *amount, *reputation)
            }
            TxData::Vote { proposal_id, option } => {
                GovernanceContract::vote(world_state, ops_sop, &tx.sender, proposal_id, *option, tx.timestamp)
                    .map(|_| ())
            }
            TxData::ProposeRootCause { content } => {
                let proposal_id = ops_sop.propose_root_cause(tx.sender, content.clone(), tx.timestamp)?;
                let mut proposer_account = world_state.get_or_create(&tx.sender)?;
                proposer_account.root_cause_proposals.insert(
                    proposal_id.clone(),
                    Proposal::new(proposal_id, tx.sender, content.clone(), tx.timestamp),
                );
                world_state.update(&proposer_account)?;
                Ok(())
            }
            TxData::SubmitAnalysis { summary, raw } => {
                ops_sop.submit_data_collection(tx.sender, summary.clone(), raw.clone(), tx.timestamp)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::KeyPair;

    fn setup_funded_sender(ws: &WorldState, registry: &mut PublicKeyRegistry, balance: u64) -> (chain_crypto::Address, KeyPair) {
        let kp = KeyPair::generate();
        let address = chain_crypto::Address::from_public_key(&kp.public_key_bytes());
        let mut account = ws.create(&address).unwrap();
        account.balance = balance;
        ws.update(&account).unwrap();
        registry.register(address, kp.public_key());
        (address, kp)
    }

    #[test]
    fn successful_transfer_debits_gas_and_bumps_nonce() {
        let ws = WorldState::open_temporary().unwrap();
        let mut registry = PublicKeyRegistry::new();
        let mut ops_sop = OpsSopContract::new();
        let (alice, kp) = setup_funded_sender(&ws, &mut registry, 10_000);
        let bob = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());
        let treasury = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());

        let mut tx = Transaction::new_unsigned(alice, 0, 1, 5_000, TxData::Transfer { to: bob, amount: 300 }, 0);
        tx.sign(&kp).unwrap();

        let outcome = StateProcessor::process(&tx, &ws, &registry, &mut ops_sop, &treasury).unwrap();
        assert!(matches!(outcome, Outcome::Applied));

        let alice_account = ws.get(&alice).unwrap().unwrap();
        assert_eq!(alice_account.balance, 10_000 - 300 - 5_000);
        assert_eq!(alice_account.nonce, 1);
        assert_eq!(ws.get(&bob).unwrap().unwrap().balance, 300);
    }

    #[test]
    fn insufficient_balance_for_transfer_refunds_gas_and_leaves_nonce() {
        let ws = WorldState::open_temporary().unwrap();
        let mut registry = PublicKeyRegistry::new();
        let mut ops_sop = OpsSopContract::new();
        let (alice, kp) = setup_funded_sender(&ws, &mut registry, 5_000);
        let bob = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());
        let treasury = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());

        let mut tx = Transaction::new_unsigned(alice, 0, 1, 5_000, TxData::Transfer { to: bob, amount: 300 }, 0);
        tx.sign(&kp).unwrap();

        let outcome = StateProcessor::process(&tx, &ws, &registry, &mut ops_sop, &treasury).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(CoreError::ContractPreconditionFailed(_))));

        let alice_account = ws.get(&alice).unwrap().unwrap();
        assert_eq!(alice_account.balance, 5_000);
        assert_eq!(alice_account.nonce, 0);
    }

    #[test]
    fn nonce_mismatch_is_rejected_before_any_debit() {
        let ws = WorldState::open_temporary().unwrap();
        let mut registry = PublicKeyRegistry::new();
        let mut ops_sop = OpsSopContract::new();
        let (alice, kp) = setup_funded_sender(&ws, &mut registry, 10_000);
        let bob = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());
        let treasury = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());

        let mut tx = Transaction::new_unsigned(alice, 1, 1, 5_000, TxData::Transfer { to: bob, amount: 300 }, 0);
        tx.sign(&kp).unwrap();

        let outcome = StateProcessor::process(&tx, &ws, &registry, &mut ops_sop, &treasury).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(CoreError::NonceMismatch { .. })));
        assert_eq!(ws.get(&alice).unwrap().unwrap().balance, 10_000);
    }

    #[test]
    fn unknown_signer_is_rejected() {
        let ws = WorldState::open_temporary().unwrap();
        let registry = PublicKeyRegistry::new();
        let mut ops_sop = OpsSopContract::new();
        let kp = KeyPair::generate();
        let ghost = chain_crypto::Address::from_public_key(&kp.public_key_bytes());
        let bob = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());
        let treasury = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());

        let mut tx = Transaction::new_unsigned(ghost, 0, 1, 5_000, TxData::Transfer { to: bob, amount: 1 }, 0);
        tx.sign(&kp).unwrap();

        let outcome = StateProcessor::process(&tx, &ws, &registry, &mut ops_sop, &treasury).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(CoreError::UnknownSigner(_))));
    }

    #[test]
    fn slash_from_a_non_treasury_sender_is_rejected() {
        let ws = WorldState::open_temporary().unwrap();
        let mut registry = PublicKeyRegistry::new();
        let mut ops_sop = OpsSopContract::new();
        let (alice, kp) = setup_funded_sender(&ws, &mut registry, 10_000);
        let (victim, _) = setup_funded_sender(&ws, &mut registry, 0);
        let treasury = chain_crypto::Address::from_public_key(&KeyPair::generate().public_key_bytes());

        let mut victim_account = ws.get(&victim).unwrap().unwrap();
        victim_account.stake = 500;
        ws.update(&victim_account).unwrap();

        let mut tx = Transaction::new_unsigned(
            alice,
            0,
            1,
            5_000,
            TxData::Slash { target: victim, amount: 500 },
            0,
        );
        tx.sign(&kp).unwrap();

        let outcome = StateProcessor::process(&tx, &ws, &registry, &mut ops_sop, &treasury).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(CoreError::ContractPreconditionFailed(_))));
        assert_eq!(ws.get(&victim).unwrap().unwrap().stake, 500);
    }
}
