//! Encrypted key-custody store for the Arx wallet.
//!
//! Holds private key material for both wallet key families — ledger
//! (transaction-signing) and identity (network record-signing) — plus one
//! deterministic HD chain, and switches between plaintext and
//! AES-encrypted-at-rest bookkeeping gated by a passphrase-derived master
//! key:
//!
//! - [`PlainKeyStore`] — baseline in-memory maps, no encryption
//! - [`CryptoKeyStore`] — the lock/unlock state machine over encrypted
//!   records, substitutable for the plain store via [`KeyStore`]
//! - [`HdChain`] — deterministic seed plus optional mnemonic, encrypted and
//!   decrypted under the same master key

pub mod crypted;
pub mod error;
pub mod hd;
pub mod plain;

pub use crypted::{CryptoKeyStore, EncryptedRecord, StoreState};
pub use error::KeystoreError;
pub use hd::{ChainId, HdChain};
pub use plain::{KeyStore, PlainKeyStore};
