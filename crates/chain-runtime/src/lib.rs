pub mod error;
pub mod processor;
pub mod reward_engine;

pub use error::{Result, RuntimeError};
pub use processor::{Outcome, StateProcessor};
pub use reward_engine::RewardEngine;
