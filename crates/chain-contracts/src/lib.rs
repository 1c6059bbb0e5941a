pub mod error;
pub mod event;
pub mod governance;
pub mod ops_sop;
pub mod token;

pub use error::{ContractError, Result};
pub use event::Event;
pub use governance::GovernanceContract;
pub use ops_sop::{IncidentData, OpsSopContract, ProposalRecord};
pub use token::TokenContract;
