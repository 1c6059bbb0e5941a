use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};
use crate::hash::sha256;

/// A 20-byte account address, derived from a public key's SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// `address(public_key_bytes)`: first 20 bytes of SHA-256 of the
    /// public-key material, lowercase hex.
    pub fn from_public_key(public_key_bytes: &[u8]) -> Self {
        let digest = sha256(public_key_bytes);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidHashLength {
                expected: 20,
                actual: v.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.to_hex()
    }
}

impl TryFrom<String> for Address {
    type Error = CryptoError;

    fn try_from(s: String) -> Result<Self> {
        Address::from_hex(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::KeyPair;

    #[test]
    fn address_is_20_bytes_of_pubkey_hash() {
        let kp = KeyPair::generate();
        let addr = Address::from_public_key(&kp.public_key_bytes());
        assert_eq!(addr.as_bytes().len(), 20);
        assert_eq!(addr.to_hex().len(), 40);
    }

    #[test]
    fn hex_roundtrip() {
        let kp = KeyPair::generate();
        let addr = Address::from_public_key(&kp.public_key_bytes());
        assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);
    }
}
