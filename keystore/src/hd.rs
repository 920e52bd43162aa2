//! Deterministic (HD) chain: one seed plus an optional mnemonic, from which
//! all wallet keys can be regenerated.

use arx_crypto::{blake2b_256, seed_from_mnemonic, MnemonicError};
use arx_types::SecureBytes;
use std::fmt;

/// Identity of an HD chain: the Blake2b-256 hash of its plaintext seed.
///
/// The id doubles as the IV source when the seed and mnemonic are encrypted,
/// and as the self-consistency anchor: a decrypted seed whose hash does not
/// equal the stored id is rejected.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ChainId([u8; 32]);

impl ChainId {
    pub fn from_seed(seed: &[u8]) -> Self {
        Self(blake2b_256(seed))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0[..4].iter().map(|b| format!("{:02x}", b)).collect();
        write!(f, "ChainId({})", head)
    }
}

/// One deterministic wallet chain.
///
/// While `crypted` is false, `seed`, `mnemonic`, and `mnemonic_passphrase`
/// hold plaintext; afterwards they hold ciphertext and the `id` keeps
/// referring to the plaintext seed.
#[derive(Clone)]
pub struct HdChain {
    seed: SecureBytes,
    mnemonic: SecureBytes,
    mnemonic_passphrase: SecureBytes,
    id: ChainId,
    crypted: bool,
}

impl HdChain {
    /// Build a chain from raw seed bytes (no mnemonic).
    pub fn from_seed(seed: SecureBytes) -> Self {
        let id = ChainId::from_seed(seed.as_slice());
        Self {
            seed,
            mnemonic: SecureBytes::new(Vec::new()),
            mnemonic_passphrase: SecureBytes::new(Vec::new()),
            id,
            crypted: false,
        }
    }

    /// Build a chain from a BIP39 mnemonic and optional passphrase.
    pub fn from_mnemonic(phrase: &str, passphrase: &str) -> Result<Self, MnemonicError> {
        let seed = seed_from_mnemonic(phrase, passphrase)?;
        let id = ChainId::from_seed(seed.as_slice());
        Ok(Self {
            seed,
            mnemonic: SecureBytes::from(phrase.as_bytes()),
            mnemonic_passphrase: SecureBytes::from(passphrase.as_bytes()),
            id,
            crypted: false,
        })
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn seed(&self) -> &SecureBytes {
        &self.seed
    }

    /// Hash of the currently held seed bytes. Equals [`HdChain::id`] only
    /// while the seed is plaintext and the chain is self-consistent.
    pub fn seed_hash(&self) -> ChainId {
        ChainId::from_seed(self.seed.as_slice())
    }

    pub fn mnemonic(&self) -> &SecureBytes {
        &self.mnemonic
    }

    pub fn mnemonic_passphrase(&self) -> &SecureBytes {
        &self.mnemonic_passphrase
    }

    pub fn is_crypted(&self) -> bool {
        self.crypted
    }

    pub(crate) fn replace_seed(&mut self, seed: SecureBytes) {
        self.seed = seed;
    }

    pub(crate) fn replace_mnemonic(&mut self, mnemonic: SecureBytes, passphrase: SecureBytes) {
        self.mnemonic = mnemonic;
        self.mnemonic_passphrase = passphrase;
    }

    pub(crate) fn set_crypted(&mut self, crypted: bool) {
        self.crypted = crypted;
    }
}

impl fmt::Debug for HdChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdChain")
            .field("id", &self.id)
            .field("crypted", &self.crypted)
            .field("has_mnemonic", &!self.mnemonic.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arx_crypto::generate_mnemonic;

    #[test]
    fn chain_from_seed_is_self_consistent() {
        let chain = HdChain::from_seed(SecureBytes::from(vec![7u8; 64]));
        assert_eq!(chain.id(), chain.seed_hash());
        assert!(!chain.is_crypted());
        assert!(chain.mnemonic().is_empty());
    }

    #[test]
    fn chain_from_mnemonic_keeps_phrase() {
        let phrase = generate_mnemonic().unwrap();
        let chain = HdChain::from_mnemonic(&phrase, "hunter2").unwrap();
        assert_eq!(chain.id(), chain.seed_hash());
        assert_eq!(chain.mnemonic().as_slice(), phrase.as_bytes());
        assert_eq!(chain.mnemonic_passphrase().as_slice(), b"hunter2");
        assert_eq!(chain.seed().len(), 64);
    }

    #[test]
    fn same_mnemonic_same_id() {
        let phrase = generate_mnemonic().unwrap();
        let a = HdChain::from_mnemonic(&phrase, "").unwrap();
        let b = HdChain::from_mnemonic(&phrase, "").unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn passphrase_changes_id() {
        let phrase = generate_mnemonic().unwrap();
        let a = HdChain::from_mnemonic(&phrase, "").unwrap();
        let b = HdChain::from_mnemonic(&phrase, "salted").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn invalid_mnemonic_rejected() {
        assert!(HdChain::from_mnemonic("definitely not words", "").is_err());
    }
}
