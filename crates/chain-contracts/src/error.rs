use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("amount must be non-negative")]
    NegativeAmount,

    #[error("unknown sender account")]
    UnknownSender,

    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("{sender} is not authorized to {action}")]
    Unauthorized { sender: String, action: String },

    #[error(transparent)]
    State(#[from] chain_state::StateError),
}

pub type Result<T> = std::result::Result<T, ContractError>;
