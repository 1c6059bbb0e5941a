use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use chain_crypto::Address;

use crate::proposal::{Proposal, Vote};

/// Default reputation assigned to newly materialised accounts (§3).
pub const DEFAULT_REPUTATION: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub stake: u64,
    #[serde(default = "default_reputation")]
    pub reputation: i32,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub root_cause_proposals: BTreeMap<String, Proposal>,
    #[serde(default)]
    pub votes: BTreeMap<String, Vote>,
}

fn default_reputation() -> i32 {
    DEFAULT_REPUTATION
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            name: String::new(),
            balance: 0,
            stake: 0,
            reputation: DEFAULT_REPUTATION,
            nonce: 0,
            root_cause_proposals: BTreeMap::new(),
            votes: BTreeMap::new(),
        }
    }

    /// Adjusts reputation by `delta`, clamping to the `0..=100` invariant
    /// of §3.
    pub fn adjust_reputation(&mut self, delta: i32) {
        self.reputation = (self.reputation + delta).clamp(0, 100);
    }

    /// Canonical voting weight (§4.4): `1 + max(0, (reputation-50)/10) +
    /// stake/1000`. Guarantees `w >= 1`.
    pub fn vote_weight(&self) -> f64 {
        let reputation_term = ((self.reputation - 50) as f64 / 10.0).max(0.0);
        let stake_term = self.stake as f64 / 1000.0;
        1.0 + reputation_term + stake_term
    }
}
