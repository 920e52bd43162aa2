//! Baseline in-memory key store with no encryption.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use arx_crypto::{IdentityKeyPair, LedgerKeyPair};
use arx_types::KeyId;

use crate::error::KeystoreError;

/// The capability set shared by the plain and encrypted stores.
///
/// Collaborators hold a reference to this trait and stay agnostic to
/// whether encryption is active; the record-publishing and transaction
/// layers depend on that substitutability.
pub trait KeyStore {
    /// Add a transaction-signing key pair; returns its id.
    fn add_ledger_key(&self, pair: LedgerKeyPair) -> Result<KeyId, KeystoreError>;

    /// Add a network-identity key pair; returns its id.
    fn add_identity_key(&self, pair: IdentityKeyPair) -> Result<KeyId, KeystoreError>;

    fn get_ledger_key(&self, id: &KeyId) -> Result<LedgerKeyPair, KeystoreError>;

    fn get_identity_key(&self, id: &KeyId) -> Result<IdentityKeyPair, KeystoreError>;

    /// Public key bytes for either family, including watch-only entries.
    fn get_public_key(&self, id: &KeyId) -> Result<Vec<u8>, KeystoreError>;
}

/// The raw maps, shared between the standalone plain store and the
/// encrypted store (which keeps them behind its own single lock).
#[derive(Default)]
pub(crate) struct PlainMaps {
    pub(crate) ledger: HashMap<KeyId, LedgerKeyPair>,
    pub(crate) identity: HashMap<KeyId, IdentityKeyPair>,
    pub(crate) watch_only: HashMap<KeyId, Vec<u8>>,
}

impl PlainMaps {
    pub(crate) fn add_ledger(&mut self, pair: LedgerKeyPair) -> KeyId {
        let id = pair.key_id();
        self.ledger.insert(id, pair);
        id
    }

    pub(crate) fn add_identity(&mut self, pair: IdentityKeyPair) -> KeyId {
        let id = pair.key_id();
        self.identity.insert(id, pair);
        id
    }

    pub(crate) fn add_watch_only(&mut self, public: Vec<u8>) -> KeyId {
        let id = KeyId::from_public(&public);
        self.watch_only.insert(id, public);
        id
    }

    pub(crate) fn get_ledger(&self, id: &KeyId) -> Option<&LedgerKeyPair> {
        self.ledger.get(id)
    }

    pub(crate) fn get_identity(&self, id: &KeyId) -> Option<&IdentityKeyPair> {
        self.identity.get(id)
    }

    pub(crate) fn get_public(&self, id: &KeyId) -> Option<Vec<u8>> {
        if let Some(pair) = self.ledger.get(id) {
            return Some(pair.public_bytes());
        }
        if let Some(pair) = self.identity.get(id) {
            return Some(pair.public_bytes());
        }
        self.watch_only.get(id).cloned()
    }

    /// True when no private key of either family is resident.
    /// Watch-only entries carry no secrets and do not count.
    pub(crate) fn is_empty(&self) -> bool {
        self.ledger.is_empty() && self.identity.is_empty()
    }

    pub(crate) fn identity_public_keys(&self) -> Vec<Vec<u8>> {
        self.identity.values().map(|p| p.public_bytes()).collect()
    }
}

/// In-memory key store holding plaintext private keys for both families.
pub struct PlainKeyStore {
    maps: Mutex<PlainMaps>,
}

impl PlainKeyStore {
    pub fn new() -> Self {
        Self {
            maps: Mutex::new(PlainMaps::default()),
        }
    }

    fn maps(&self) -> MutexGuard<'_, PlainMaps> {
        self.maps.lock().expect("plain key store mutex poisoned")
    }

    pub fn add_watch_only(&self, public: Vec<u8>) -> KeyId {
        self.maps().add_watch_only(public)
    }

    pub fn have_key(&self, id: &KeyId) -> bool {
        let maps = self.maps();
        maps.ledger.contains_key(id) || maps.identity.contains_key(id)
    }

    pub fn identity_public_keys(&self) -> Vec<Vec<u8>> {
        self.maps().identity_public_keys()
    }
}

impl Default for PlainKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for PlainKeyStore {
    fn add_ledger_key(&self, pair: LedgerKeyPair) -> Result<KeyId, KeystoreError> {
        Ok(self.maps().add_ledger(pair))
    }

    fn add_identity_key(&self, pair: IdentityKeyPair) -> Result<KeyId, KeystoreError> {
        Ok(self.maps().add_identity(pair))
    }

    fn get_ledger_key(&self, id: &KeyId) -> Result<LedgerKeyPair, KeystoreError> {
        self.maps()
            .get_ledger(id)
            .cloned()
            .ok_or(KeystoreError::UnknownKey(*id))
    }

    fn get_identity_key(&self, id: &KeyId) -> Result<IdentityKeyPair, KeystoreError> {
        self.maps()
            .get_identity(id)
            .cloned()
            .ok_or(KeystoreError::UnknownKey(*id))
    }

    fn get_public_key(&self, id: &KeyId) -> Result<Vec<u8>, KeystoreError> {
        self.maps()
            .get_public(id)
            .ok_or(KeystoreError::UnknownKey(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get_ledger_key() {
        let store = PlainKeyStore::new();
        let pair = LedgerKeyPair::generate();
        let public = pair.public_bytes();
        let secret = pair.secret_bytes();

        let id = store.add_ledger_key(pair).unwrap();
        let fetched = store.get_ledger_key(&id).unwrap();
        assert_eq!(fetched.public_bytes(), public);
        assert_eq!(fetched.secret_bytes(), secret);
    }

    #[test]
    fn add_and_get_identity_key() {
        let store = PlainKeyStore::new();
        let pair = IdentityKeyPair::generate();
        let seed = pair.seed_bytes();

        let id = store.add_identity_key(pair).unwrap();
        let fetched = store.get_identity_key(&id).unwrap();
        assert_eq!(fetched.seed_bytes(), seed);
    }

    #[test]
    fn unknown_key_is_reported() {
        let store = PlainKeyStore::new();
        let id = KeyId::from_public(b"nobody");
        assert!(matches!(
            store.get_ledger_key(&id),
            Err(KeystoreError::UnknownKey(_))
        ));
        assert!(matches!(
            store.get_public_key(&id),
            Err(KeystoreError::UnknownKey(_))
        ));
    }

    #[test]
    fn watch_only_resolves_public_key() {
        let store = PlainKeyStore::new();
        let pair = LedgerKeyPair::generate();
        let public = pair.public_bytes();

        let id = store.add_watch_only(public.clone());
        assert_eq!(store.get_public_key(&id).unwrap(), public);
        // watch-only entries have no private half
        assert!(store.get_ledger_key(&id).is_err());
        assert!(!store.have_key(&id));
    }

    #[test]
    fn get_public_key_covers_both_families() {
        let store = PlainKeyStore::new();
        let ledger = LedgerKeyPair::generate();
        let identity = IdentityKeyPair::generate();
        let ledger_pub = ledger.public_bytes();
        let identity_pub = identity.public_bytes();

        let lid = store.add_ledger_key(ledger).unwrap();
        let iid = store.add_identity_key(identity).unwrap();
        assert_eq!(store.get_public_key(&lid).unwrap(), ledger_pub);
        assert_eq!(store.get_public_key(&iid).unwrap(), identity_pub);
    }

    #[test]
    fn identity_public_keys_enumerates() {
        let store = PlainKeyStore::new();
        store.add_identity_key(IdentityKeyPair::generate()).unwrap();
        store.add_identity_key(IdentityKeyPair::generate()).unwrap();
        assert_eq!(store.identity_public_keys().len(), 2);
    }
}
