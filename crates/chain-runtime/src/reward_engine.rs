use chain_core::{Transaction, TxData, VoteOption};
use chain_crypto::{Address, KeyPair};
use chain_state::WorldState;

use crate::error::Result;

/// Bounty base awarded to a passed proposal's proposer, on top of the
/// 800-token consensus reward (§4.9).
const BOUNTY_BASE: u64 = 1_000;
const PROPOSER_PASS_REWARD: u64 = 800;
const PROPOSER_PASS_REPUTATION: i32 = 5;
const VOTER_PASS_REWARD: u64 = 300;
const VOTER_PASS_REPUTATION: i32 = 1;
const AGAINST_ON_PASS_PENALTY: u64 = 50;
const AGAINST_ON_PASS_REPUTATION: i32 = -1;

const PROPOSER_FAIL_PENALTY: u64 = 300;
const PROPOSER_FAIL_REPUTATION: i32 = -5;
const VOTER_FAIL_PENALTY: u64 = 100;
const VOTER_FAIL_REPUTATION: i32 = -1;

/// Gas parameters assumed for the purpose of the 70% rebate, matching the
/// vote transaction's own minimum (§4.5) rather than the actual gas an
/// individual voter paid.
const REBATE_RATIO: f64 = 0.7;
const ASSUMED_VOTE_GAS_LIMIT: u64 = 200;
const ASSUMED_VOTE_GAS_PRICE: u64 = 1;

/// Post-consensus disbursement builder (§4.9, C10). Builds one signed
/// reward/penalty transaction per disbursement line item, each debited
/// from or credited to the Treasury; the caller mines them in a follow-up
/// block so every disbursement is independently auditable on-chain.
pub struct RewardEngine;

impl RewardEngine {
    pub fn build_disbursements(
        world_state: &WorldState,
        treasury_key: &KeyPair,
        proposal_id: &str,
        passed: bool,
        gas_price: u64,
    ) -> Result<Vec<Transaction>> {
        let treasury_address = Address::from_public_key(&treasury_key.public_key_bytes());
        let treasury_account = world_state.get_or_create(&treasury_address)?;

        let Some((_owner, proposal)) = world_state.find_proposal(proposal_id)? else {
            return Ok(Vec::new());
        };

        let mut voters = Vec::new();
        for voter_address in world_state.voters_of(proposal_id)? {
            if let Some(account) = world_state.get(&voter_address)? {
                if let Some(vote) = account.votes.get(proposal_id).cloned() {
                    voters.push((voter_address, vote));
                }
            }
        }

        let mut nonce = treasury_account.nonce;
        let mut txs = Vec::new();
        let timestamp = proposal.timestamp;

        let mut push = |target: Address, amount: u64, reputation: i32, memo: String, penalty: bool| -> Result<()> {
            let data = if penalty {
                TxData::Penalty { target, amount, reputation, memo }
            } else {
                TxData::Reward { target, amount, reputation, memo }
            };
            let gas_limit = data.tx_type().minimum_gas_limit();
            let mut tx = Transaction::new_unsigned(
                treasury_address,
                nonce,
                gas_price,
                gas_limit,
                data,
                timestamp,
            );
            nonce += 1;
            tx.sign(treasury_key)?;
            txs.push(tx);
            Ok(())
        };

        if passed {
            push(
                proposal.proposer,
                PROPOSER_PASS_REWARD,
                PROPOSER_PASS_REPUTATION,
                format!("Proposal Passed: {proposal_id}"),
                false,
            )?;
            push(
                proposal.proposer,
                BOUNTY_BASE,
                0,
                format!("Bounty: {proposal_id}"),
                false,
            )?;

            let rebate = (REBATE_RATIO * ASSUMED_VOTE_GAS_LIMIT as f64 * ASSUMED_VOTE_GAS_PRICE as f64) as u64;
            for (address, vote) in &voters {
                if vote.option == VoteOption::For {
                    push(
                        *address,
                        VOTER_PASS_REWARD,
                        VOTER_PASS_REPUTATION,
                        format!("Voting Support: {proposal_id}"),
                        false,
                    )?;
                    push(
                        *address,
                        rebate,
                        0,
                        format!("Gas Rebate (70%): {proposal_id}"),
                        false,
                    )?;
                }
            }
            for (address, vote) in &voters {
                if vote.option == VoteOption::Against {
                    push(
                        *address,
                        AGAINST_ON_PASS_PENALTY,
                        AGAINST_ON_PASS_REPUTATION,
                        format!("Against Passed: {proposal_id}"),
                        true,
                    )?;
                }
            }
        } else {
            push(
                proposal.proposer,
                PROPOSER_FAIL_PENALTY,
                PROPOSER_FAIL_REPUTATION,
                format!("Proposal Failed: {proposal_id}"),
                true,
            )?;
            for (address, vote) in &voters {
                if vote.option == VoteOption::For {
                    push(
                        *address,
                        VOTER_FAIL_PENALTY,
                        VOTER_FAIL_REPUTATION,
                        format!("Support Failed: {proposal_id}"),
                        true,
                    )?;
                }
            }
        }

        Ok(txs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_contracts::OpsSopContract;

    fn voter_with(ws: &WorldState, option: VoteOption, weight: f64, proposal_id: &str) -> Address {
        let kp = KeyPair::generate();
        let address = Address::from_public_key(&kp.public_key_bytes());
        let mut account = ws.create(&address).unwrap();
        account.votes.insert(
            proposal_id.to_string(),
            chain_core::Vote {
                proposal_id: proposal_id.to_string(),
                option,
                weight,
                timestamp: 0,
            },
        );
        ws.update(&account).unwrap();
        address
    }

    #[test]
    fn passed_proposal_rewards_proposer_and_for_voters() {
        let ws = WorldState::open_temporary().unwrap();
        let mut sop = OpsSopContract::new();
        let proposer_kp = KeyPair::generate();
        let proposer = Address::from_public_key(&proposer_kp.public_key_bytes());
        ws.create(&proposer).unwrap();

        sop.submit_data_collection(proposer, "s".into(), serde_json::json!({}), 0).unwrap();
        let pid = sop.propose_root_cause(proposer, "root cause".into(), 0).unwrap();

        let for_voter = voter_with(&ws, VoteOption::For, 6.0, &pid);
        let against_voter = voter_with(&ws, VoteOption::Against, 1.0, &pid);

        // materialise the proposal-owner index the way the state processor
        // would after a `propose_root_cause` transaction
        let mut owner = ws.get(&proposer).unwrap().unwrap();
        owner.root_cause_proposals.insert(
            pid.clone(),
            chain_core::Proposal::new(pid.clone(), proposer, "root cause".into(), 0),
        );
        ws.update(&owner).unwrap();

        let treasury_key = KeyPair::generate();
        let treasury = Address::from_public_key(&treasury_key.public_key_bytes());
        let mut treasury_account = ws.create(&treasury).unwrap();
        treasury_account.balance = 100_000;
        ws.update(&treasury_account).unwrap();

        let txs = RewardEngine::build_disbursements(&ws, &treasury_key, &pid, true, 1).unwrap();

        // proposer reward + bounty, for-voter reward + rebate, against-voter penalty
        assert_eq!(txs.len(), 5);
        assert!(txs.iter().all(|tx| tx.sender == treasury));
        let nonces: Vec<u64> = txs.iter().map(|tx| tx.nonce).collect();
        assert_eq!(nonces, vec![0, 1, 2, 3, 4]);

        let proposer_txs: Vec<_> = txs
            .iter()
            .filter(|tx| matches!(&tx.data, TxData::Reward { target, .. } if *target == proposer))
            .collect();
        assert_eq!(proposer_txs.len(), 2);

        let voter_txs: Vec<_> = txs
            .iter()
            .filter(|tx| matches!(&tx.data, TxData::Reward { target, .. } if *target == for_voter))
            .collect();
        assert_eq!(voter_txs.len(), 2);

        let penalty_txs: Vec<_> = txs
            .iter()
            .filter(|tx| matches!(&tx.data, TxData::Penalty { target, .. } if *target == against_voter))
            .collect();
        assert_eq!(penalty_txs.len(), 1);
    }

    #[test]
    fn rejected_proposal_penalizes_proposer_and_for_voters() {
        let ws = WorldState::open_temporary().unwrap();
        let mut sop = OpsSopContract::new();
        let proposer_kp = KeyPair::generate();
        let proposer = Address::from_public_key(&proposer_kp.public_key_bytes());
        ws.create(&proposer).unwrap();

        sop.submit_data_collection(proposer, "s".into(), serde_json::json!({}), 0).unwrap();
        let pid = sop.propose_root_cause(proposer, "root cause".into(), 0).unwrap();
        let for_voter = voter_with(&ws, VoteOption::For, 1.0, &pid);
        let _ = for_voter;

        let mut owner = ws.get(&proposer).unwrap().unwrap();
        owner.root_cause_proposals.insert(
            pid.clone(),
            chain_core::Proposal::new(pid.clone(), proposer, "root cause".into(), 0),
        );
        ws.update(&owner).unwrap();

        let treasury_key = KeyPair::generate();
        let txs = RewardEngine::build_disbursements(&ws, &treasury_key, &pid, false, 1).unwrap();

        assert_eq!(txs.len(), 2);
        assert!(txs.iter().all(|tx| matches!(tx.data, TxData::Penalty { .. })));
    }
}
