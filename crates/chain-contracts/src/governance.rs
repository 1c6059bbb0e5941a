use chain_core::{Proposal, ProposalStatus, Vote, VoteOption, VoteTally};
use chain_crypto::Address;
use chain_state::WorldState;

use crate::error::Result;
use crate::ops_sop::OpsSopContract;

/// Weighted-vote tallying and consensus detection (§4.4). Calls into
/// `OpsSopContract` through its ordinary public methods rather than
/// reaching into its storage — there is no reentrancy path back into the
/// transaction that triggered the vote (§9 REDESIGN FLAGS).
pub struct GovernanceContract;

impl GovernanceContract {
    /// `vote{proposal_id, option}`. Returns the recomputed tally.
    pub fn vote(
        world_state: &WorldState,
        ops_sop: &mut OpsSopContract,
        voter: &Address,
        proposal_id: &str,
        option: VoteOption,
        timestamp: u64,
    ) -> Result<VoteTally> {
        let owner = match world_state.find_proposal(proposal_id)? {
            Some((owner, _proposal)) => owner,
            None => {
                let mut synthetic_owner = world_state.get_or_create(voter)?;
                let proposal = Proposal::new(
                    proposal_id.to_string(),
                    *voter,
                    format!("Auto-created proposal for vote {proposal_id}"),
                    timestamp,
                );
                synthetic_owner
                    .root_cause_proposals
                    .insert(proposal_id.to_string(), proposal);
                world_state.update(&synthetic_owner)?;
                *voter
            }
        };

        let mut voter_account = world_state.get_or_create(voter)?;
        let weight = voter_account.vote_weight();
        voter_account.votes.insert(
            proposal_id.to_string(),
            Vote {
                proposal_id: proposal_id.to_string(),
                option,
                weight,
                timestamp,
            },
        );
        world_state.update(&voter_account)?;

        let tally = Self::recompute_tally(world_state, proposal_id)?;

        let mut owner_account = world_state
            .get(&owner)?
            .expect("owner account materialised above");
        if let Some(proposal) = owner_account.root_cause_proposals.get_mut(proposal_id) {
            proposal.votes = tally;
        }

        Self::check_consensus(ops_sop, proposal_id, tally, timestamp);

        if let Some(proposal) = owner_account.root_cause_proposals.get_mut(proposal_id) {
            proposal.status = match ops_sop.current_state() {
                chain_core::SopState::Consensus | chain_core::SopState::Solution => {
                    ProposalStatus::Passed
                }
                chain_core::SopState::DataCollected
                    if ops_sop.current_proposal().is_none() && proposal.status == ProposalStatus::Pending =>
                {
                    ProposalStatus::Rejected
                }
                _ => proposal.status,
            };
        }
        world_state.update(&owner_account)?;

        Ok(tally)
    }

    /// Recomputes the full tally from voter-side records alone — never
    /// from an incrementally-updated counter, which could drift (§9).
    fn recompute_tally(world_state: &WorldState, proposal_id: &str) -> Result<VoteTally> {
        let mut tally = VoteTally::default();
        for voter_address in world_state.voters_of(proposal_id)? {
            let Some(account) = world_state.get(&voter_address)? else {
                continue;
            };
            let Some(vote) = account.votes.get(proposal_id) else {
                continue;
            };
            match vote.option {
                VoteOption::For => tally.for_ += vote.weight,
                VoteOption::Against => tally.against += vote.weight,
                VoteOption::Abstain => tally.abstain += vote.weight,
            }
        }
        Ok(tally)
    }

    /// `total_participating_weight` is the sum over accounts that have
    /// voted this proposal — non-voters and the Treasury never inflate the
    /// denominator (§4.4 step 6).
    fn check_consensus(ops_sop: &mut OpsSopContract, proposal_id: &str, tally: VoteTally, timestamp: u64) {
        let total = tally.for_ + tally.against + tally.abstain;
        if total <= 0.0 {
            return;
        }

        let outcome = if tally.for_ > 0.5 * total {
            Some(true)
        } else if tally.against > 0.5 * total {
            Some(false)
        } else {
            None
        };

        let Some(passed) = outcome else { return };
        if let Err(err) = ops_sop.advance(proposal_id, passed, timestamp) {
            tracing::warn!(%proposal_id, passed, error = %err, "consensus advance skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::KeyPair;

    fn addr() -> Address {
        Address::from_public_key(&KeyPair::generate().public_key_bytes())
    }

    fn voter_with(ws: &WorldState, reputation: i32, stake: u64) -> Address {
        let a = addr();
        let mut account = ws.create(&a).unwrap();
        account.reputation = reputation;
        account.stake = stake;
        ws.update(&account).unwrap();
        a
    }

    #[test]
    fn auto_materialises_missing_proposal() {
        let ws = WorldState::open_temporary().unwrap();
        let mut sop = OpsSopContract::new();
        let voter = voter_with(&ws, 80, 2000);

        let tally = GovernanceContract::vote(&ws, &mut sop, &voter, "ghost-id", VoteOption::For, 1).unwrap();
        assert_eq!(tally.for_, 6.0);

        let (_owner, proposal) = ws.find_proposal("ghost-id").unwrap().unwrap();
        assert!(proposal.content.starts_with("Auto-created proposal"));
    }

    #[test]
    fn weighted_consensus_matches_worked_example() {
        let ws = WorldState::open_temporary().unwrap();
        let mut sop = OpsSopContract::new();
        let proposer = voter_with(&ws, 100, 0);
        sop.submit_data_collection(proposer, "s".into(), serde_json::json!({}), 1).unwrap();
        let pid = sop.propose_root_cause(proposer, "root cause".into(), 2).unwrap();

        let voter_a = voter_with(&ws, 80, 2000); // weight 6.0
        let voter_b = voter_with(&ws, 60, 1000); // weight 1+1+1=3.0
        let voter_c = voter_with(&ws, 50, 0); // weight 1.0

        GovernanceContract::vote(&ws, &mut sop, &voter_a, &pid, VoteOption::For, 3).unwrap();
        GovernanceContract::vote(&ws, &mut sop, &voter_b, &pid, VoteOption::For, 4).unwrap();
        let tally = GovernanceContract::vote(&ws, &mut sop, &voter_c, &pid, VoteOption::Against, 5).unwrap();

        assert_eq!(tally.for_, 9.0);
        assert_eq!(tally.against, 1.0);
        assert_eq!(sop.current_state(), chain_core::SopState::Solution);
    }

    #[test]
    fn revote_overwrites_without_double_counting() {
        let ws = WorldState::open_temporary().unwrap();
        let mut sop = OpsSopContract::new();
        let proposer = voter_with(&ws, 100, 0);
        sop.submit_data_collection(proposer, "s".into(), serde_json::json!({}), 1).unwrap();
        let pid = sop.propose_root_cause(proposer, "root cause".into(), 2).unwrap();

        let voter_a = voter_with(&ws, 80, 2000); // 6.0
        let voter_b = voter_with(&ws, 60, 1000); // 3.0
        let voter_c = voter_with(&ws, 50, 0); // 1.0

        GovernanceContract::vote(&ws, &mut sop, &voter_a, &pid, VoteOption::For, 3).unwrap();
        GovernanceContract::vote(&ws, &mut sop, &voter_b, &pid, VoteOption::For, 4).unwrap();
        GovernanceContract::vote(&ws, &mut sop, &voter_c, &pid, VoteOption::Against, 5).unwrap();

        let tally = GovernanceContract::vote(&ws, &mut sop, &voter_c, &pid, VoteOption::For, 6).unwrap();
        assert_eq!(tally.for_, 10.0);
        assert_eq!(tally.against, 0.0);
    }
}
