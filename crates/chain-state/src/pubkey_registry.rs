use std::collections::HashMap;

use chain_crypto::{Address, PublicKey};

/// Maps known addresses to their public key, so signature verification
/// doesn't require the signer to attach their key on every transaction.
///
/// Deliberately an explicit, owned value rather than a module-level
/// singleton (§9 REDESIGN FLAGS: the original's class-level registry
/// made tests interfere with one another through shared global state).
/// A `Node` owns exactly one of these and threads it through explicitly.
#[derive(Debug, Default, Clone)]
pub struct PublicKeyRegistry {
    keys: HashMap<Address, PublicKey>,
}

impl PublicKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, address: Address, public_key: PublicKey) {
        self.keys.insert(address, public_key);
    }

    pub fn lookup(&self, address: &Address) -> Option<&PublicKey> {
        self.keys.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::KeyPair;

    #[test]
    fn register_then_lookup() {
        let kp = KeyPair::generate();
        let address = Address::from_public_key(&kp.public_key_bytes());
        let mut registry = PublicKeyRegistry::new();
        assert!(registry.lookup(&address).is_none());

        registry.register(address, kp.public_key());
        assert_eq!(registry.lookup(&address), Some(&kp.public_key()));
    }

    #[test]
    fn two_registries_do_not_share_state() {
        let kp = KeyPair::generate();
        let address = Address::from_public_key(&kp.public_key_bytes());

        let mut a = PublicKeyRegistry::new();
        a.register(address, kp.public_key());

        let b = PublicKeyRegistry::new();
        assert!(b.lookup(&address).is_none());
        assert!(a.contains(&address));
    }
}
