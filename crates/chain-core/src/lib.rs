pub mod account;
pub mod block;
pub mod error;
pub mod proposal;
pub mod transaction;

pub use account::{Account, DEFAULT_REPUTATION};
pub use block::{Block, BlockHeader, GENESIS_PREVIOUS_HASH};
pub use error::{CoreError, Result};
pub use proposal::{Proposal, ProposalStatus, SopState, Vote, VoteTally};
pub use transaction::{Transaction, TxData, TxType, VoteOption};
