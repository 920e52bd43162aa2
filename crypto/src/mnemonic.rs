//! BIP39 mnemonic helpers for deterministic chain seeds.
//!
//! A chain seed is the 64-byte BIP39 seed (PBKDF2-HMAC-SHA512 over the
//! normalized phrase and optional passphrase). The custody store treats the
//! seed as opaque bytes; all derivation of child keys happens elsewhere.

use arx_types::SecureBytes;
use bip39::Mnemonic;
use rand::RngCore;
use thiserror::Error;

/// Errors arising from mnemonic operations.
#[derive(Debug, Error)]
pub enum MnemonicError {
    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("entropy generation failed: {0}")]
    Entropy(String),
}

/// Generate a new 24-word BIP39 mnemonic from 256-bit entropy.
pub fn generate_mnemonic() -> Result<String, MnemonicError> {
    let mut entropy = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    let mnemonic =
        Mnemonic::from_entropy(&entropy).map_err(|e| MnemonicError::Entropy(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Derive the 64-byte chain seed from a mnemonic and optional passphrase.
pub fn seed_from_mnemonic(phrase: &str, passphrase: &str) -> Result<SecureBytes, MnemonicError> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| MnemonicError::InvalidMnemonic(e.to_string()))?;
    let seed = mnemonic.to_seed_normalized(passphrase);
    Ok(SecureBytes::from(seed.to_vec()))
}

/// Validate that a phrase is a well-formed BIP39 mnemonic.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_normalized(phrase).is_ok()
}
