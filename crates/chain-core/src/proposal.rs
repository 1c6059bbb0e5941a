use serde::{Deserialize, Serialize};

use chain_crypto::Address;

use crate::transaction::VoteOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Passed,
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VoteTally {
    #[serde(rename = "for")]
    pub for_: f64,
    pub against: f64,
    pub abstain: f64,
}

/// A root-cause hypothesis awaiting weighted vote (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: String,
    pub proposer: Address,
    pub content: String,
    pub timestamp: u64,
    pub votes: VoteTally,
    pub status: ProposalStatus,
}

impl Proposal {
    pub fn new(proposal_id: String, proposer: Address, content: String, timestamp: u64) -> Self {
        Self {
            proposal_id,
            proposer,
            content,
            timestamp,
            votes: VoteTally::default(),
            status: ProposalStatus::Pending,
        }
    }
}

/// A single voter's ballot on a proposal. At most one per (voter, proposal):
/// stored keyed by `proposal_id` inside the voter's `Account::votes`, so a
/// second vote overwrites rather than appends (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: String,
    pub option: VoteOption,
    pub weight: f64,
    pub timestamp: u64,
}

/// Ordered incident lifecycle (§3, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SopState {
    Init,
    DataCollected,
    RootCauseProposed,
    Consensus,
    Solution,
}

impl Default for SopState {
    fn default() -> Self {
        SopState::Init
    }
}
