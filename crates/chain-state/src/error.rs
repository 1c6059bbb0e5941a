use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;
