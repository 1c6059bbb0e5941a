use serde::Serialize;

use crate::error::Result;
use crate::hash::{sha256, Hash256};

/// Canonical serialization: sorted keys, compact separators, no whitespace.
/// `serde_json::Map` is backed by a `BTreeMap` (the `preserve_order` feature
/// is never enabled in this workspace), so any `serde_json::Value` produced
/// from a `Serialize` type already serializes with lexicographically sorted
/// keys; we only need the compact (default) formatter.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let as_value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&as_value)?)
}

/// The digest of a type's canonical JSON encoding — used as both the
/// identifying hash (tx-id, block-hash) and the message that gets signed.
pub fn canonical_digest<T: Serialize>(value: &T) -> Result<Hash256> {
    let json = canonical_json(value)?;
    Ok(sha256(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct Unordered {
        zeta: u32,
        alpha: u32,
    }

    #[test]
    fn keys_are_sorted_regardless_of_struct_field_order() {
        let value = Unordered { zeta: 1, alpha: 2 };
        let encoded = canonical_json(&value).unwrap();
        assert_eq!(encoded, r#"{"alpha":2,"zeta":1}"#);
    }

    #[test]
    fn compact_separators_no_whitespace() {
        let value = json!({"b": [1, 2], "a": {"x": 1}});
        let encoded = canonical_json(&value).unwrap();
        assert!(!encoded.contains(' '));
        assert_eq!(encoded, r#"{"a":{"x":1},"b":[1,2]}"#);
    }
}
