use thiserror::Error;

/// Fatal runtime failures — anything else is surfaced as a `RejectReason`
/// on the per-transaction outcome rather than propagated as an error,
/// since rejecting one transaction must never abort the rest of a block
/// (§4.5, §7).
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    State(#[from] chain_state::StateError),

    #[error(transparent)]
    Crypto(#[from] chain_crypto::CryptoError),

    #[error(transparent)]
    Core(#[from] chain_core::CoreError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
