use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] chain_core::CoreError),

    #[error(transparent)]
    Runtime(#[from] chain_runtime::RuntimeError),

    #[error(transparent)]
    State(#[from] chain_state::StateError),

    #[error("transaction rejected at admission: {0}")]
    Rejected(chain_core::CoreError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
