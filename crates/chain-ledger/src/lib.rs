pub mod error;
pub mod node;

pub use error::{LedgerError, Result};
pub use node::{Node, DEFAULT_GAS_PRICE};
