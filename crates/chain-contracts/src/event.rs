use serde::{Deserialize, Serialize};

use chain_crypto::sha256;

/// One entry of the OpsSOP append-only event stream (§4.8, §6). `id` is
/// derived from `name|timestamp|payload` so two events can never collide
/// unless they are byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub timestamp: u64,
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(name: &str, timestamp: u64, payload: serde_json::Value) -> Self {
        let material = format!("{name}|{timestamp}|{payload}");
        let id = sha256(material.as_bytes()).to_hex();
        Self {
            id,
            name: name.to_string(),
            timestamp,
            payload,
        }
    }
}
