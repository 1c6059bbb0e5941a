use thiserror::Error;

/// Error kinds from §7 of the design: admission errors are returned to the
/// submitter synchronously, execution errors are reflected by a
/// transaction's absence from the resulting block.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown signer: no public key registered for address {0}")]
    UnknownSigner(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("nonce mismatch: expected {expected}, got {actual}")]
    NonceMismatch { expected: u64, actual: u64 },

    #[error("gas limit too low: {actual} below minimum {minimum} for {tx_type}")]
    GasLimitTooLow {
        tx_type: String,
        actual: u64,
        minimum: u64,
    },

    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("contract precondition failed: {0}")]
    ContractPreconditionFailed(String),

    #[error("chain corruption detected: {0}")]
    ChainCorruption(String),

    #[error("storage persist error: {0}")]
    StoragePersistError(String),

    #[error("canonical encoding error: {0}")]
    Crypto(#[from] chain_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
