use std::collections::BTreeMap;

use chain_core::{ProposalStatus, SopState};
use chain_crypto::{sha256, Address};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ContractError, Result};
use crate::event::Event;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentData {
    pub submitter: Address,
    pub summary: String,
    pub raw: serde_json::Value,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub proposal_id: String,
    pub proposer: Address,
    pub content: String,
    pub timestamp: u64,
    pub status: ProposalStatus,
}

/// The incident lifecycle state machine (§4.8). Owned by the `Node` root
/// collaborator, not a process-wide singleton (§9 REDESIGN FLAGS) — tests
/// construct a fresh instance per scenario instead of calling a global
/// reset.
#[derive(Debug, Clone, Default)]
pub struct OpsSopContract {
    state: SopState,
    incident_data: Option<IncidentData>,
    proposals: BTreeMap<String, ProposalRecord>,
    current_proposal_id: Option<String>,
    events: Vec<Event>,
}

impl OpsSopContract {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, name: &str, timestamp: u64, payload: serde_json::Value) {
        let event = Event::new(name, timestamp, payload);
        tracing::info!(event = name, id = %event.id, "sop event emitted");
        self.events.push(event);
    }

    /// `Init -> DataCollected`.
    pub fn submit_data_collection(
        &mut self,
        agent: Address,
        summary: String,
        raw: serde_json::Value,
        timestamp: u64,
    ) -> Result<()> {
        if self.state != SopState::Init {
            return Err(ContractError::PreconditionFailed(
                "data collection can only be submitted in Init state".into(),
            ));
        }

        self.incident_data = Some(IncidentData {
            submitter: agent,
            summary: summary.clone(),
            raw,
            timestamp,
        });
        self.state = SopState::DataCollected;
        self.emit(
            "DataCollected",
            timestamp,
            json!({ "agent_id": agent.to_hex(), "summary": summary }),
        );
        Ok(())
    }

    /// `DataCollected -> RootCauseProposed`. Returns the new proposal id.
    pub fn propose_root_cause(
        &mut self,
        agent: Address,
        content: String,
        timestamp: u64,
    ) -> Result<String> {
        if self.state != SopState::DataCollected {
            return Err(ContractError::PreconditionFailed(
                "root cause can only be proposed after data collection".into(),
            ));
        }

        let proposal_id =
            sha256(format!("{}|{}|{}", agent.to_hex(), timestamp, content).as_bytes()).to_hex();

        self.proposals.insert(
            proposal_id.clone(),
            ProposalRecord {
                proposal_id: proposal_id.clone(),
                proposer: agent,
                content: content.clone(),
                timestamp,
                status: ProposalStatus::Pending,
            },
        );
        self.current_proposal_id = Some(proposal_id.clone());
        self.state = SopState::RootCauseProposed;
        self.emit(
            "RootCauseProposed",
            timestamp,
            json!({ "proposal_id": proposal_id, "proposer": agent.to_hex(), "content": content }),
        );
        Ok(proposal_id)
    }

    /// Called only by the governance contract after a consensus check
    /// (§4.4 step 6). Never called from within another contract's own
    /// transaction effects, to forbid the reentrancy the design notes warn
    /// against (§9).
    pub fn advance(&mut self, proposal_id: &str, passed: bool, timestamp: u64) -> Result<()> {
        if self.state != SopState::RootCauseProposed {
            return Err(ContractError::PreconditionFailed(
                "consensus can only advance from RootCauseProposed".into(),
            ));
        }
        if self.current_proposal_id.as_deref() != Some(proposal_id) {
            return Err(ContractError::PreconditionFailed(
                "proposal id does not match the current active proposal".into(),
            ));
        }

        if passed {
            self.state = SopState::Consensus;
            self.emit(
                "ConsensusReached",
                timestamp,
                json!({ "proposal_id": proposal_id, "passed": true }),
            );

            self.state = SopState::Solution;
            let content = self
                .proposals
                .get(proposal_id)
                .map(|p| p.content.clone())
                .unwrap_or_default();
            self.emit(
                "SolutionPhaseEntered",
                timestamp,
                json!({ "proposal_id": proposal_id, "root_cause": content }),
            );
            if let Some(record) = self.proposals.get_mut(proposal_id) {
                record.status = ProposalStatus::Passed;
            }
        } else {
            self.state = SopState::DataCollected;
            self.current_proposal_id = None;
            self.emit(
                "ConsensusReached",
                timestamp,
                json!({ "proposal_id": proposal_id, "passed": false }),
            );
            let proposer = self
                .proposals
                .get(proposal_id)
                .map(|p| p.proposer.to_hex())
                .unwrap_or_default();
            self.emit(
                "ProposalRejected",
                timestamp,
                json!({ "proposal_id": proposal_id, "proposer": proposer }),
            );
            if let Some(record) = self.proposals.get_mut(proposal_id) {
                record.status = ProposalStatus::Rejected;
            }
        }
        Ok(())
    }

    pub fn reset_for_testing(&mut self) {
        *self = Self::new();
    }

    pub fn current_state(&self) -> SopState {
        self.state
    }

    pub fn events(&self, limit: usize) -> Vec<&Event> {
        let start = self.events.len().saturating_sub(limit);
        self.events[start..].iter().collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// All events appended since `start` (an earlier `event_count()`
    /// reading) — used to scan exactly the events a single block's
    /// transactions produced.
    pub fn events_since(&self, start: usize) -> &[Event] {
        &self.events[start.min(self.events.len())..]
    }

    pub fn current_proposal(&self) -> Option<&ProposalRecord> {
        self.current_proposal_id
            .as_ref()
            .and_then(|id| self.proposals.get(id))
    }

    pub fn incident_data(&self) -> Option<&IncidentData> {
        self.incident_data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::KeyPair;

    fn agent() -> Address {
        Address::from_public_key(&KeyPair::generate().public_key_bytes())
    }

    #[test]
    fn full_happy_path_to_solution() {
        let mut sop = OpsSopContract::new();
        let a = agent();
        sop.submit_data_collection(a, "disk full".into(), json!({}), 1)
            .unwrap();
        assert_eq!(sop.current_state(), SopState::DataCollected);

        let pid = sop.propose_root_cause(a, "log rotation misconfigured".into(), 2).unwrap();
        assert_eq!(sop.current_state(), SopState::RootCauseProposed);

        sop.advance(&pid, true, 3).unwrap();
        assert_eq!(sop.current_state(), SopState::Solution);

        let names: Vec<&str> = sop.events(10).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "DataCollected",
                "RootCauseProposed",
                "ConsensusReached",
                "SolutionPhaseEntered"
            ]
        );
    }

    #[test]
    fn rejected_consensus_reverts_to_data_collected() {
        let mut sop = OpsSopContract::new();
        let a = agent();
        sop.submit_data_collection(a, "s".into(), json!({}), 1).unwrap();
        let pid = sop.propose_root_cause(a, "c".into(), 2).unwrap();
        sop.advance(&pid, false, 3).unwrap();
        assert_eq!(sop.current_state(), SopState::DataCollected);
        assert!(sop.current_proposal().is_none());

        // a fresh proposal can be submitted after rejection
        let pid2 = sop.propose_root_cause(a, "c2".into(), 4).unwrap();
        assert_ne!(pid, pid2);
    }

    #[test]
    fn cannot_submit_data_collection_twice() {
        let mut sop = OpsSopContract::new();
        let a = agent();
        sop.submit_data_collection(a, "s".into(), json!({}), 1).unwrap();
        assert!(sop.submit_data_collection(a, "s2".into(), json!({}), 2).is_err());
    }
}
