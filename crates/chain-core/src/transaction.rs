use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use chain_crypto::{canonical_digest, Address, Hash256, KeyPair, PublicKey, Signature};

use crate::error::Result;

/// Classifies a transaction for dispatch (§4.5) and for the gas minimums of
/// §4.5. Mirrors `TransactionType` constants in the original Python model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Transfer,
    Stake,
    Slash,
    Vote,
    ProposeRootCause,
    Reward,
    Penalty,
    SubmitAnalysis,
}

impl TxType {
    /// Minimum gas limit enforced at mempool admission (§4.5).
    pub fn minimum_gas_limit(self) -> u64 {
        match self {
            TxType::Transfer => 5_000,
            TxType::Stake => 5_000,
            TxType::Slash => 5_000,
            TxType::Vote => 200,
            TxType::Reward => 200,
            TxType::Penalty => 200,
            TxType::ProposeRootCause => 30_000,
            TxType::SubmitAnalysis => 30_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxType::Transfer => "transfer",
            TxType::Stake => "stake",
            TxType::Slash => "slash",
            TxType::Vote => "vote",
            TxType::ProposeRootCause => "propose_root_cause",
            TxType::Reward => "reward",
            TxType::Penalty => "penalty",
            TxType::SubmitAnalysis => "submit_analysis",
        }
    }
}

/// One of the {for, against, abstain} options a `Vote` may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    For,
    Against,
    Abstain,
}

/// Tagged variant over transaction types (§9 REDESIGN FLAGS): each tx_type
/// carries a struct of exactly the fields it needs instead of a free-form
/// map, so a type mismatch is a compile error rather than a runtime
/// `ContractPreconditionFailed`. `#[serde(untagged)]` keeps the wire form a
/// plain nested map, matching §6's canonical encoding, for `Serialize`.
///
/// `Deserialize` is deliberately NOT derived: several variants share an
/// identical or subset field shape (`Reward`/`Penalty` are structurally
/// identical; `Stake`'s single field is a subset of `Slash`/`Reward`/
/// `Penalty`), so untagged resolution by trying variants in order would
/// silently pick the wrong one. `from_tagged` resolves the payload using
/// the sibling `tx_type` field already carried on `Transaction` instead.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TxData {
    Transfer { to: Address, amount: u64 },
    Stake { amount: u64 },
    Slash { target: Address, amount: u64 },
    Vote { proposal_id: String, option: VoteOption },
    ProposeRootCause { content: String },
    Reward { target: Address, amount: u64, reputation: i32, memo: String },
    Penalty { target: Address, amount: u64, reputation: i32, memo: String },
    SubmitAnalysis { summary: String, raw: serde_json::Value },
}

impl TxData {
    pub fn tx_type(&self) -> TxType {
        match self {
            TxData::Transfer { .. } => TxType::Transfer,
            TxData::Stake { .. } => TxType::Stake,
            TxData::Slash { .. } => TxType::Slash,
            TxData::Vote { .. } => TxType::Vote,
            TxData::ProposeRootCause { .. } => TxType::ProposeRootCause,
            TxData::Reward { .. } => TxType::Reward,
            TxData::Penalty { .. } => TxType::Penalty,
            TxData::SubmitAnalysis { .. } => TxType::SubmitAnalysis,
        }
    }

    /// Builds the payload for a known `tx_type` from its (untagged) JSON
    /// object, the unambiguous counterpart to the derived `Serialize`.
    fn from_tagged(tx_type: TxType, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match tx_type {
            TxType::Transfer => {
                #[derive(Deserialize)]
                struct Raw {
                    to: Address,
                    amount: u64,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::Transfer { to: raw.to, amount: raw.amount }
            }
            TxType::Stake => {
                #[derive(Deserialize)]
                struct Raw {
                    amount: u64,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::Stake { amount: raw.amount }
            }
            TxType::Slash => {
                #[derive(Deserialize)]
                struct Raw {
                    target: Address,
                    amount: u64,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::Slash { target: raw.target, amount: raw.amount }
            }
            TxType::Vote => {
                #[derive(Deserialize)]
                struct Raw {
                    proposal_id: String,
                    option: VoteOption,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::Vote { proposal_id: raw.proposal_id, option: raw.option }
            }
            TxType::ProposeRootCause => {
                #[derive(Deserialize)]
                struct Raw {
                    content: String,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::ProposeRootCause { content: raw.content }
            }
            TxType::Reward => {
                #[derive(Deserialize)]
                struct Raw {
                    target: Address,
                    amount: u64,
                    reputation: i32,
                    memo: String,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::Reward {
                    target: raw.target,
                    amount: raw.amount,
                    reputation: raw.reputation,
                    memo: raw.memo,
                }
            }
            TxType::Penalty => {
                #[derive(Deserialize)]
                struct Raw {
                    target: Address,
                    amount: u64,
                    reputation: i32,
                    memo: String,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::Penalty {
                    target: raw.target,
                    amount: raw.amount,
                    reputation: raw.reputation,
                    memo: raw.memo,
                }
            }
            TxType::SubmitAnalysis => {
                #[derive(Deserialize)]
                struct Raw {
                    summary: String,
                    raw: serde_json::Value,
                }
                let raw: Raw = serde_json::from_value(value)?;
                TxData::SubmitAnalysis { summary: raw.summary, raw: raw.raw }
            }
        })
    }
}

/// A signed transaction. `tx_type` is kept alongside `data` (rather than
/// derived solely from the `TxData` variant) because it is part of the wire
/// format in §6 and is cheaper to branch on during dispatch — and, since
/// `TxData` alone is not a sufficient discriminant for `Reward` vs.
/// `Penalty`, it also doubles as the tag `Transaction::deserialize` uses to
/// resolve `data`.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub tx_type: TxType,
    pub sender: Address,
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub data: TxData,
    pub signature: Option<Signature>,
    pub timestamp: u64,
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            tx_type: TxType,
            sender: Address,
            nonce: u64,
            gas_price: u64,
            gas_limit: u64,
            data: serde_json::Value,
            signature: Option<Signature>,
            timestamp: u64,
        }
        let raw = Raw::deserialize(deserializer)?;
        let data = TxData::from_tagged(raw.tx_type, raw.data).map_err(de::Error::custom)?;
        Ok(Transaction {
            tx_type: raw.tx_type,
            sender: raw.sender,
            nonce: raw.nonce,
            gas_price: raw.gas_price,
            gas_limit: raw.gas_limit,
            data,
            signature: raw.signature,
            timestamp: raw.timestamp,
        })
    }
}

/// The canonical form of a transaction excludes `signature` (§3). This is a
/// distinct type, not a skip-serializing flag on `Transaction`, so that the
/// signing/identity digest can never accidentally include it.
#[derive(Serialize)]
struct SigningPayload<'a> {
    tx_type: TxType,
    sender: &'a Address,
    nonce: u64,
    gas_price: u64,
    gas_limit: u64,
    data: &'a TxData,
    timestamp: u64,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new_unsigned(
        sender: Address,
        nonce: u64,
        gas_price: u64,
        gas_limit: u64,
        data: TxData,
        timestamp: u64,
    ) -> Self {
        Self {
            tx_type: data.tx_type(),
            sender,
            nonce,
            gas_price,
            gas_limit,
            data,
            signature: None,
            timestamp,
        }
    }

    fn signing_payload(&self) -> SigningPayload<'_> {
        SigningPayload {
            tx_type: self.tx_type,
            sender: &self.sender,
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data: &self.data,
            timestamp: self.timestamp,
        }
    }

    /// The SHA-256 of the canonical (signature-excluded) encoding. This is
    /// both the tx-id and the message that gets signed.
    pub fn digest(&self) -> Result<Hash256> {
        Ok(canonical_digest(&self.signing_payload())?)
    }

    pub fn sign(&mut self, keypair: &KeyPair) -> Result<()> {
        let digest = self.digest()?;
        self.signature = Some(keypair.sign(&digest));
        Ok(())
    }

    /// `gas_fee = gas_price * gas_limit` (§4.5).
    pub fn gas_fee(&self) -> u64 {
        self.gas_price.saturating_mul(self.gas_limit)
    }

    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<()> {
        let digest = self.digest()?;
        let signature = self
            .signature
            .as_ref()
            .ok_or(chain_crypto::CryptoError::VerificationFailed)?;
        chain_crypto::verify(&digest, signature, public_key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_excluded_from_digest() {
        let kp = KeyPair::generate();
        let sender = Address::from_public_key(&kp.public_key_bytes());
        let mut tx = Transaction::new_unsigned(
            sender,
            0,
            1,
            5_000,
            TxData::Transfer { to: sender, amount: 10 },
            0,
        );
        let digest_before = tx.digest().unwrap();
        tx.sign(&kp).unwrap();
        let digest_after = tx.digest().unwrap();
        assert_eq!(digest_before, digest_after);
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let kp = KeyPair::generate();
        let sender = Address::from_public_key(&kp.public_key_bytes());
        let mut tx = Transaction::new_unsigned(
            sender,
            0,
            1,
            5_000,
            TxData::Stake { amount: 10 },
            0,
        );
        tx.sign(&kp).unwrap();
        assert!(tx.verify_signature(&kp.public_key()).is_ok());
    }

    #[test]
    fn tampering_with_payload_breaks_verification() {
        let kp = KeyPair::generate();
        let sender = Address::from_public_key(&kp.public_key_bytes());
        let mut tx = Transaction::new_unsigned(
            sender,
            0,
            1,
            5_000,
            TxData::Stake { amount: 10 },
            0,
        );
        tx.sign(&kp).unwrap();
        tx.nonce = 1;
        assert!(tx.verify_signature(&kp.public_key()).is_err());
    }
}
