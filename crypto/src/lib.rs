//! Cryptographic primitives for the Arx custody core.
//!
//! - **Blake2b** for hashing (key ids, per-key IV derivation, chain ids)
//! - **AES-256-CBC** for encrypting private key material at rest
//! - **secp256k1** for the ledger (transaction-signing) key family
//! - **Ed25519** for the identity (network record-signing) key family
//! - BIP39 mnemonic helpers for deterministic chain seeds

pub mod cipher;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod mnemonic;

pub use cipher::{Crypter, CipherError, CIPHER_BLOCK_SIZE};
pub use hash::{blake2b_256, blake2b_256_multi};
pub use kdf::{derive_key_iv, DerivationMethod, KdfError, KDF_IV_SIZE, KDF_KEY_SIZE, KDF_SALT_SIZE};
pub use keys::{
    IdentityKeyPair, KeyError, KeyFamily, KeyMaterial, LedgerKeyPair, IDENTITY_SECRET_HEX_SIZE,
    IDENTITY_SEED_SIZE, LEDGER_SECRET_SIZE,
};
pub use mnemonic::{generate_mnemonic, seed_from_mnemonic, validate_mnemonic, MnemonicError};
