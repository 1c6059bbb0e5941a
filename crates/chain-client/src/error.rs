use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error(transparent)]
    Ledger(#[from] chain_ledger::LedgerError),

    #[error(transparent)]
    State(#[from] chain_state::StateError),

    #[error(transparent)]
    Core(#[from] chain_core::CoreError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
