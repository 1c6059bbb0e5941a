use std::fmt;

use secp256k1::ecdsa;
use secp256k1::{Message, PublicKey as Secp256k1PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};
use crate::hash::Hash256;

/// A secp256k1 public key, serialized compressed (33 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PublicKey(Secp256k1PublicKey);

impl PublicKey {
    pub fn to_bytes(&self) -> [u8; 33] {
        self.0.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let inner = Secp256k1PublicKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self(inner))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl From<PublicKey> for String {
    fn from(pk: PublicKey) -> Self {
        pk.to_hex()
    }
}

impl TryFrom<String> for PublicKey {
    type Error = CryptoError;

    fn try_from(s: String) -> Result<Self> {
        PublicKey::from_hex(&s)
    }
}

/// A DER-encoded ECDSA signature over secp256k1.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn as_der_bytes(&self) -> &[u8] {
        &self.0
    }

    fn to_ecdsa(&self) -> Result<ecdsa::Signature> {
        ecdsa::Signature::from_der(&self.0)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.to_hex()
    }
}

impl TryFrom<String> for Signature {
    type Error = CryptoError;

    fn try_from(s: String) -> Result<Self> {
        Signature::from_hex(&s)
    }
}

/// An secp256k1 keypair used to sign transaction digests.
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, public) = secp.generate_keypair(&mut rng);
        Self {
            secret,
            public: PublicKey(public),
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret =
            SecretKey::from_slice(bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let secp = Secp256k1::new();
        let public = PublicKey(Secp256k1PublicKey::from_secret_key(&secp, &secret));
        Ok(Self { secret, public })
    }

    pub fn from_secret_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public.to_bytes()
    }

    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    pub fn export_secret_hex(&self) -> String {
        hex::encode(self.secret_key_bytes())
    }

    /// Sign a 32-byte digest (a transaction or message hash), returning a
    /// DER-encoded ECDSA signature.
    pub fn sign(&self, digest: &Hash256) -> Signature {
        sign(digest, &self.secret)
    }

    pub fn verify(&self, digest: &Hash256, signature: &Signature) -> bool {
        verify(digest, signature, &self.public).is_ok()
    }
}

/// `sign(digest, private_key)`, exposed as a free function so callers that
/// hold only a raw `SecretKey` (e.g. the Treasury key) need not construct a
/// full `KeyPair`.
pub fn sign(digest: &Hash256, secret_key: &SecretKey) -> Signature {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest.as_bytes());
    let sig = secp.sign_ecdsa(&message, secret_key);
    Signature(sig.serialize_der().to_vec())
}

/// `verify(digest, signature, public_key)`. Failure signals `InvalidSignature`
/// at the call site (the chain maps this to the `InvalidSignature` admission
/// error).
pub fn verify(digest: &Hash256, signature: &Signature, public_key: &PublicKey) -> Result<()> {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest.as_bytes());
    let sig = signature.to_ecdsa()?;
    secp.verify_ecdsa(&message, &sig, &public_key.0)
        .map_err(|_| CryptoError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = KeyPair::generate();
        let digest = sha256(b"a transaction digest");
        let sig = kp.sign(&digest);
        assert!(kp.verify(&digest, &sig));
    }

    #[test]
    fn verify_rejects_wrong_digest() {
        let kp = KeyPair::generate();
        let sig = kp.sign(&sha256(b"original"));
        assert!(!kp.verify(&sha256(b"tampered"), &sig));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let digest = sha256(b"message");
        let sig = kp1.sign(&digest);
        assert!(!kp2.verify(&digest, &sig));
    }

    #[test]
    fn secret_hex_roundtrip() {
        let kp = KeyPair::generate();
        let hex = kp.export_secret_hex();
        let restored = KeyPair::from_secret_hex(&hex).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }
}
