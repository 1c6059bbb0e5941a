use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid hash length: expected {expected} bytes, got {actual}")]
    InvalidHashLength { expected: usize, actual: usize },

    #[error("invalid secp256k1 key: {0}")]
    InvalidKey(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("signature does not verify against the given public key")]
    VerificationFailed,

    #[error("canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("a merkle tree needs at least one leaf")]
    EmptyMerkleTree,

    #[error("leaf index out of range for merkle proof")]
    InvalidMerkleProof,
}

pub type Result<T> = std::result::Result<T, CryptoError>;
