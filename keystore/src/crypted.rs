//! The encrypted key-custody store and its lock/unlock state machine.
//!
//! A store starts plain, migrates once to encrypted bookkeeping via
//! [`CryptoKeyStore::encrypt_keys`], and never reverts. From then on the
//! resident master key is the sole unlock signal: present means unlocked,
//! absent means locked, and locking wipes it rather than merely dropping it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use arx_crypto::{
    blake2b_256, Crypter, IdentityKeyPair, KeyFamily, KeyMaterial, LedgerKeyPair, KDF_IV_SIZE,
};
use arx_types::{KeyId, MasterKey, SecureBytes};

use crate::error::KeystoreError;
use crate::hd::HdChain;
use crate::plain::{KeyStore, PlainMaps};

/// Ciphertext of one private key, paired with its public key.
///
/// Carries no IV: the IV is recomputed as the first 16 bytes of the
/// Blake2b-256 hash of `public`, so a record is meaningless without the
/// public key stored alongside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    pub public: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Current position of the store in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreState {
    /// No encrypted bookkeeping; keys are held in plaintext maps.
    Plain,
    /// Encrypted, no master key resident.
    Locked,
    /// Encrypted, master key resident, full capability.
    Unlocked,
    /// Encrypted, master key resident but only the mixing operation class
    /// is permitted; counts as locked for key writes.
    UnlockedForMixingOnly,
}

type StatusCallback = Box<dyn Fn(StoreState) + Send + Sync>;

// ── Per-record encryption helpers ───────────────────────────────────────

fn encrypt_secret(
    master: &MasterKey,
    plaintext: &SecureBytes,
    iv_source: &[u8; 32],
) -> Result<Vec<u8>, KeystoreError> {
    let mut crypter = Crypter::new();
    crypter.set_key(master.as_bytes(), &iv_source[..KDF_IV_SIZE])?;
    Ok(crypter.encrypt(plaintext.as_slice())?)
}

fn decrypt_secret(
    master: &MasterKey,
    ciphertext: &[u8],
    iv_source: &[u8; 32],
) -> Result<SecureBytes, KeystoreError> {
    let mut crypter = Crypter::new();
    crypter.set_key(master.as_bytes(), &iv_source[..KDF_IV_SIZE])?;
    Ok(crypter.decrypt(ciphertext)?)
}

fn encrypt_material(
    master: &MasterKey,
    material: &KeyMaterial,
) -> Result<EncryptedRecord, KeystoreError> {
    let iv_source = material.identity_hash();
    let ciphertext = encrypt_secret(master, &material.secret_bytes(), &iv_source)?;
    Ok(EncryptedRecord {
        public: material.public_bytes(),
        ciphertext,
    })
}

fn decrypt_ledger_key(
    master: &MasterKey,
    record: &EncryptedRecord,
) -> Result<LedgerKeyPair, KeystoreError> {
    let iv_source = blake2b_256(&record.public);
    let secret = decrypt_secret(master, &record.ciphertext, &iv_source)?;
    Ok(LedgerKeyPair::from_secret_checked(
        secret.as_slice(),
        &record.public,
    )?)
}

fn decrypt_identity_key(
    master: &MasterKey,
    record: &EncryptedRecord,
) -> Result<IdentityKeyPair, KeystoreError> {
    let iv_source = blake2b_256(&record.public);
    let secret = decrypt_secret(master, &record.ciphertext, &iv_source)?;
    Ok(IdentityKeyPair::from_secret_checked(
        secret.as_slice(),
        &record.public,
    )?)
}

/// Decrypt-and-verify without keeping the result; the unlock scan only
/// needs the verdict.
fn verify_record(master: &MasterKey, family: KeyFamily, record: &EncryptedRecord) -> bool {
    let iv_source = blake2b_256(&record.public);
    let Ok(secret) = decrypt_secret(master, &record.ciphertext, &iv_source) else {
        return false;
    };
    KeyMaterial::from_secret_checked(family, secret.as_slice(), &record.public).is_ok()
}

// ── Store internals ─────────────────────────────────────────────────────

struct Inner {
    plain: PlainMaps,
    crypted_ledger: HashMap<KeyId, EncryptedRecord>,
    crypted_identity: HashMap<KeyId, EncryptedRecord>,
    master_key: Option<MasterKey>,
    use_crypto: bool,
    mixing_only: bool,
    thoroughly_checked: bool,
    hd_chain: Option<HdChain>,
    crypted_hd_chain: Option<HdChain>,
}

impl Inner {
    fn new() -> Self {
        Self {
            plain: PlainMaps::default(),
            crypted_ledger: HashMap::new(),
            crypted_identity: HashMap::new(),
            master_key: None,
            use_crypto: false,
            mixing_only: false,
            thoroughly_checked: false,
            hd_chain: None,
            crypted_hd_chain: None,
        }
    }

    /// Enter encrypted bookkeeping mode. Idempotent; refused while any
    /// plaintext private key is still resident.
    fn set_crypted(&mut self) -> Result<(), KeystoreError> {
        if self.use_crypto {
            return Ok(());
        }
        if !self.plain.is_empty() {
            return Err(KeystoreError::PlaintextKeysResident);
        }
        self.use_crypto = true;
        Ok(())
    }

    fn status(&self) -> StoreState {
        if !self.use_crypto {
            StoreState::Plain
        } else if self.master_key.is_none() {
            StoreState::Locked
        } else if self.mixing_only {
            StoreState::UnlockedForMixingOnly
        } else {
            StoreState::Unlocked
        }
    }

    /// Master key for operations that need full capability (key writes).
    fn master_for_writes(&self) -> Result<&MasterKey, KeystoreError> {
        match (&self.master_key, self.mixing_only) {
            (Some(master), false) => Ok(master),
            _ => Err(KeystoreError::Locked),
        }
    }

    /// Master key for decrypt-on-demand reads; resident suffices.
    fn master_for_reads(&self) -> Result<&MasterKey, KeystoreError> {
        self.master_key.as_ref().ok_or(KeystoreError::Locked)
    }

    /// Decrypt the HD chain and verify its self-id. In plain mode the
    /// plaintext chain is returned as-is.
    fn decrypt_hd_chain(&self) -> Result<HdChain, KeystoreError> {
        if !self.use_crypto {
            return self.hd_chain.clone().ok_or(KeystoreError::NoHdChain);
        }
        let crypted = self
            .crypted_hd_chain
            .as_ref()
            .ok_or(KeystoreError::NoHdChain)?;
        if !crypted.is_crypted() {
            return Err(KeystoreError::HdChainNotCrypted);
        }
        let master = self.master_for_reads()?;
        let iv_source = *crypted.id().as_bytes();

        let seed = decrypt_secret(master, crypted.seed().as_slice(), &iv_source)?;
        let mut chain = crypted.clone();
        chain.replace_seed(seed);

        // hash of the decrypted seed must match the chain id
        if chain.seed_hash() != crypted.id() {
            return Err(KeystoreError::HdChainIdMismatch);
        }

        let mnemonic = if crypted.mnemonic().is_empty() {
            SecureBytes::new(Vec::new())
        } else {
            decrypt_secret(master, crypted.mnemonic().as_slice(), &iv_source)?
        };
        let passphrase = if crypted.mnemonic_passphrase().is_empty() {
            SecureBytes::new(Vec::new())
        } else {
            decrypt_secret(master, crypted.mnemonic_passphrase().as_slice(), &iv_source)?
        };
        chain.replace_mnemonic(mnemonic, passphrase);
        chain.set_crypted(false);
        Ok(chain)
    }
}

/// Key store that switches between plaintext and AES-encrypted-at-rest
/// bookkeeping, gated by one passphrase-derived master key.
///
/// One instance per wallet session, explicitly injected into every
/// collaborator that needs key access. All operations are serialized by a
/// single internal lock; state-change observers run synchronously on the
/// calling thread after the lock is released.
pub struct CryptoKeyStore {
    inner: Mutex<Inner>,
    observers: Mutex<Vec<StatusCallback>>,
}

impl CryptoKeyStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("key store mutex poisoned")
    }

    /// Register a callback invoked after every lock-state change.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(StoreState) + Send + Sync + 'static,
    {
        self.observers
            .lock()
            .expect("observer list mutex poisoned")
            .push(Box::new(callback));
    }

    fn notify(&self, state: StoreState) {
        let observers = self.observers.lock().expect("observer list mutex poisoned");
        for observer in observers.iter() {
            observer(state);
        }
    }

    pub fn is_crypted(&self) -> bool {
        self.lock_inner().use_crypto
    }

    /// Locked for full-capability use: no master key resident, or only the
    /// mixing operation class is allowed.
    pub fn is_locked(&self) -> bool {
        matches!(
            self.state(),
            StoreState::Locked | StoreState::UnlockedForMixingOnly
        )
    }

    pub fn state(&self) -> StoreState {
        self.lock_inner().status()
    }

    /// Enter encrypted bookkeeping mode without migrating any keys.
    ///
    /// Used when loading an already-encrypted wallet. Idempotent; refused
    /// while plaintext keys are resident.
    pub fn set_crypted(&self) -> Result<(), KeystoreError> {
        self.lock_inner().set_crypted()
    }

    /// One-shot bulk migration of every resident plaintext key of both
    /// families into encrypted records under `master`.
    ///
    /// Refused once any encrypted record exists or encrypted mode is
    /// already active. The plaintext maps are purged as the final step,
    /// under the same lock acquisition, so no caller can observe a
    /// half-migrated store after success. If any single key fails to
    /// encrypt, the error leaves the store partially migrated; the
    /// operation is not safely retryable and the session must treat that
    /// as fatal.
    pub fn encrypt_keys(&self, master: &MasterKey) -> Result<(), KeystoreError> {
        let mut inner = self.lock_inner();
        if inner.use_crypto
            || !inner.crypted_ledger.is_empty()
            || !inner.crypted_identity.is_empty()
        {
            return Err(KeystoreError::AlreadyEncrypted);
        }
        inner.use_crypto = true;

        let Inner {
            plain,
            crypted_ledger,
            crypted_identity,
            ..
        } = &mut *inner;

        for pair in plain.ledger.values() {
            let material = KeyMaterial::Ledger(pair.clone());
            let record = encrypt_material(master, &material)?;
            crypted_ledger.insert(material.key_id(), record);
        }
        plain.ledger.clear();

        for pair in plain.identity.values() {
            let material = KeyMaterial::Identity(pair.clone());
            debug!(key = %material.key_id(), "encrypting identity key");
            let record = encrypt_material(master, &material)?;
            crypted_identity.insert(material.key_id(), record);
        }
        plain.identity.clear();

        debug!(
            ledger = inner.crypted_ledger.len(),
            identity = inner.crypted_identity.len(),
            "bulk key migration complete"
        );
        Ok(())
    }

    /// Validate `master` against the resident records and, on success,
    /// commit it to memory.
    ///
    /// At least one key per family present is decrypt-verified, plus the
    /// HD chain if present. After the first fully-verified unlock of this
    /// store, later unlocks short-circuit each family after its first
    /// successful decryption. One record verifying while a sibling fails
    /// in the same scan is store corruption, reported as
    /// [`KeystoreError::Corrupted`] — distinct from the recoverable
    /// [`KeystoreError::WrongMasterKey`].
    pub fn unlock(&self, master: &MasterKey, for_mixing_only: bool) -> Result<(), KeystoreError> {
        let state = {
            let mut inner = self.lock_inner();
            inner.set_crypted()?;
            debug!(
                ledger = inner.crypted_ledger.len(),
                identity = inner.crypted_identity.len(),
                "unlock scan starting"
            );

            let mut key_pass = false;
            let mut key_fail = false;
            let families = [
                (KeyFamily::Ledger, &inner.crypted_ledger),
                (KeyFamily::Identity, &inner.crypted_identity),
            ];
            for (family, records) in families {
                for record in records.values() {
                    if record.ciphertext.is_empty() {
                        continue;
                    }
                    if verify_record(master, family, record) {
                        key_pass = true;
                        if inner.thoroughly_checked {
                            break;
                        }
                    } else {
                        warn!(?family, "unlock: record failed to decrypt");
                        key_fail = true;
                        break;
                    }
                }
            }

            if key_pass && key_fail {
                warn!("key store is probably corrupted: some keys decrypt but not all");
                return Err(KeystoreError::Corrupted);
            }
            if key_fail || (!key_pass && inner.crypted_hd_chain.is_none()) {
                return Err(KeystoreError::WrongMasterKey);
            }

            inner.master_key = Some(master.clone());

            if inner.crypted_hd_chain.is_some() && inner.decrypt_hd_chain().is_err() {
                inner.master_key = None;
                return Err(KeystoreError::WrongMasterKey);
            }

            inner.thoroughly_checked = true;
            inner.mixing_only = for_mixing_only;
            inner.status()
        };
        self.notify(state);
        Ok(())
    }

    /// Drop to locked (or mixing-only) state. Never reverts to plain.
    ///
    /// Unless `allow_mixing`, the resident master key is wiped. With
    /// `allow_mixing` the key stays resident but the store counts as
    /// locked for everything outside the mixing operation class.
    pub fn lock(&self, allow_mixing: bool) -> Result<(), KeystoreError> {
        let state = {
            let mut inner = self.lock_inner();
            inner.set_crypted()?;
            if !allow_mixing {
                // MasterKey zeroizes on drop
                inner.master_key = None;
            }
            inner.mixing_only = allow_mixing;
            inner.status()
        };
        self.notify(state);
        Ok(())
    }

    /// Insert a pre-encrypted ledger record (the load-from-disk path).
    pub fn add_crypted_ledger_key(
        &self,
        public: Vec<u8>,
        ciphertext: Vec<u8>,
    ) -> Result<KeyId, KeystoreError> {
        let mut inner = self.lock_inner();
        inner.set_crypted()?;
        let id = KeyId::from_public(&public);
        inner
            .crypted_ledger
            .insert(id, EncryptedRecord { public, ciphertext });
        Ok(id)
    }

    /// Insert a pre-encrypted identity record (the load-from-disk path).
    pub fn add_crypted_identity_key(
        &self,
        public: Vec<u8>,
        ciphertext: Vec<u8>,
    ) -> Result<KeyId, KeystoreError> {
        let mut inner = self.lock_inner();
        inner.set_crypted()?;
        let id = KeyId::from_public(&public);
        inner
            .crypted_identity
            .insert(id, EncryptedRecord { public, ciphertext });
        Ok(id)
    }

    /// Snapshot of the encrypted ledger records, for the persistence layer.
    pub fn crypted_ledger_records(&self) -> Vec<EncryptedRecord> {
        self.lock_inner().crypted_ledger.values().cloned().collect()
    }

    /// Snapshot of the encrypted identity records, for the persistence layer.
    pub fn crypted_identity_records(&self) -> Vec<EncryptedRecord> {
        self.lock_inner()
            .crypted_identity
            .values()
            .cloned()
            .collect()
    }

    pub fn have_key(&self, id: &KeyId) -> bool {
        let inner = self.lock_inner();
        if !inner.use_crypto {
            return inner.plain.ledger.contains_key(id) || inner.plain.identity.contains_key(id);
        }
        inner.crypted_ledger.contains_key(id) || inner.crypted_identity.contains_key(id)
    }

    /// Public keys of every identity-family entry, for the record publisher.
    pub fn identity_public_keys(&self) -> Vec<Vec<u8>> {
        let inner = self.lock_inner();
        if !inner.use_crypto {
            return inner.plain.identity_public_keys();
        }
        inner
            .crypted_identity
            .values()
            .map(|record| record.public.clone())
            .collect()
    }

    /// Track a public key with no private half; allowed in every state.
    pub fn add_watch_only(&self, public: Vec<u8>) -> KeyId {
        self.lock_inner().plain.add_watch_only(public)
    }

    // ── HD chain ────────────────────────────────────────────────────────

    /// Attach a plaintext chain. Only valid before encrypted mode.
    pub fn set_hd_chain(&self, chain: HdChain) -> Result<(), KeystoreError> {
        let mut inner = self.lock_inner();
        if inner.use_crypto {
            return Err(KeystoreError::AlreadyEncrypted);
        }
        if chain.is_crypted() {
            return Err(KeystoreError::HdChainCrypted);
        }
        inner.hd_chain = Some(chain);
        Ok(())
    }

    /// Attach an already-encrypted chain (the load-from-disk path).
    pub fn set_crypted_hd_chain(&self, chain: HdChain) -> Result<(), KeystoreError> {
        let mut inner = self.lock_inner();
        inner.set_crypted()?;
        if !chain.is_crypted() {
            return Err(KeystoreError::HdChainNotCrypted);
        }
        inner.crypted_hd_chain = Some(chain);
        Ok(())
    }

    /// The resident chain: the encrypted one in encrypted mode, the
    /// plaintext one otherwise.
    pub fn get_hd_chain(&self) -> Option<HdChain> {
        let inner = self.lock_inner();
        if inner.use_crypto {
            inner.crypted_hd_chain.clone()
        } else {
            inner.hd_chain.clone()
        }
    }

    /// Encrypt the resident plaintext chain under `master`.
    ///
    /// Requires encrypted bookkeeping mode (run [`Self::encrypt_keys`]
    /// first). Succeeds as a no-op when a crypted chain already exists.
    /// The seed is encrypted with the chain id as IV source; mnemonic and
    /// mnemonic passphrase are encrypted separately, each only when
    /// non-empty. The plaintext chain is cleared afterwards.
    pub fn encrypt_hd_chain(&self, master: &MasterKey) -> Result<(), KeystoreError> {
        let mut inner = self.lock_inner();
        if !inner.use_crypto {
            return Err(KeystoreError::NotEncrypted);
        }
        if inner.crypted_hd_chain.is_some() {
            return Ok(());
        }

        let crypted = {
            let chain = inner.hd_chain.as_ref().ok_or(KeystoreError::NoHdChain)?;
            // seed must match this chain before anything is encrypted
            if chain.id() != chain.seed_hash() {
                return Err(KeystoreError::HdChainIdMismatch);
            }
            let iv_source = *chain.id().as_bytes();

            let crypted_seed = encrypt_secret(master, chain.seed(), &iv_source)?;
            let mnemonic = if chain.mnemonic().is_empty() {
                SecureBytes::new(Vec::new())
            } else {
                SecureBytes::from(encrypt_secret(master, chain.mnemonic(), &iv_source)?)
            };
            let passphrase = if chain.mnemonic_passphrase().is_empty() {
                SecureBytes::new(Vec::new())
            } else {
                SecureBytes::from(encrypt_secret(
                    master,
                    chain.mnemonic_passphrase(),
                    &iv_source,
                )?)
            };

            let mut crypted = chain.clone();
            crypted.replace_seed(SecureBytes::from(crypted_seed));
            crypted.replace_mnemonic(mnemonic, passphrase);
            crypted.set_crypted(true);
            crypted
        };

        inner.crypted_hd_chain = Some(crypted);
        inner.hd_chain = None;
        debug!("hd chain encrypted");
        Ok(())
    }

    /// Decrypt the resident chain with the resident master key and verify
    /// `id == hash(seed)`; any mismatch is a decryption failure, not a
    /// silently accepted seed. Returns a chain marked not-crypted.
    pub fn decrypt_hd_chain(&self) -> Result<HdChain, KeystoreError> {
        self.lock_inner().decrypt_hd_chain()
    }
}

impl Default for CryptoKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for CryptoKeyStore {
    /// In plain mode, delegate to the plaintext maps. In encrypted mode
    /// the store must be fully unlocked; the key is encrypted immediately
    /// on insert.
    fn add_ledger_key(&self, pair: LedgerKeyPair) -> Result<KeyId, KeystoreError> {
        let mut inner = self.lock_inner();
        if !inner.use_crypto {
            return Ok(inner.plain.add_ledger(pair));
        }
        let master = inner.master_for_writes()?.clone();
        let material = KeyMaterial::Ledger(pair);
        let record = encrypt_material(&master, &material)?;
        let id = material.key_id();
        inner.crypted_ledger.insert(id, record);
        Ok(id)
    }

    fn add_identity_key(&self, pair: IdentityKeyPair) -> Result<KeyId, KeystoreError> {
        let mut inner = self.lock_inner();
        if !inner.use_crypto {
            return Ok(inner.plain.add_identity(pair));
        }
        let master = inner.master_for_writes()?.clone();
        let material = KeyMaterial::Identity(pair);
        let record = encrypt_material(&master, &material)?;
        let id = material.key_id();
        inner.crypted_identity.insert(id, record);
        Ok(id)
    }

    /// Decrypt-on-demand with the resident master key.
    fn get_ledger_key(&self, id: &KeyId) -> Result<LedgerKeyPair, KeystoreError> {
        let inner = self.lock_inner();
        if !inner.use_crypto {
            return inner
                .plain
                .get_ledger(id)
                .cloned()
                .ok_or(KeystoreError::UnknownKey(*id));
        }
        let record = inner
            .crypted_ledger
            .get(id)
            .ok_or(KeystoreError::UnknownKey(*id))?;
        let master = inner.master_for_reads()?;
        decrypt_ledger_key(master, record)
    }

    fn get_identity_key(&self, id: &KeyId) -> Result<IdentityKeyPair, KeystoreError> {
        let inner = self.lock_inner();
        if !inner.use_crypto {
            return inner
                .plain
                .get_identity(id)
                .cloned()
                .ok_or(KeystoreError::UnknownKey(*id));
        }
        let record = inner
            .crypted_identity
            .get(id)
            .ok_or(KeystoreError::UnknownKey(*id))?;
        let master = inner.master_for_reads()?;
        decrypt_identity_key(master, record)
    }

    /// Works in every state; encrypted records expose their public half,
    /// and watch-only entries fall through to the plaintext maps.
    fn get_public_key(&self, id: &KeyId) -> Result<Vec<u8>, KeystoreError> {
        let inner = self.lock_inner();
        if !inner.use_crypto {
            return inner
                .plain
                .get_public(id)
                .ok_or(KeystoreError::UnknownKey(*id));
        }
        if let Some(record) = inner.crypted_ledger.get(id) {
            return Ok(record.public.clone());
        }
        if let Some(record) = inner.crypted_identity.get(id) {
            return Ok(record.public.clone());
        }
        inner
            .plain
            .get_public(id)
            .ok_or(KeystoreError::UnknownKey(*id))
    }
}
