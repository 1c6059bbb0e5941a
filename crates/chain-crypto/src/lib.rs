pub mod address;
pub mod canonical;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod signature;

pub use address::Address;
pub use canonical::{canonical_digest, canonical_json};
pub use error::{CryptoError, Result};
pub use hash::{hash_pair, merkle_root, sha256, Hash256};
pub use merkle::{MerkleProof, MerkleTree};
pub use signature::{sign, verify, KeyPair, PublicKey, Signature};
