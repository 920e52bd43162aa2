//! The two wallet key families.
//!
//! Ledger keys sign transactions (secp256k1, 33-byte compressed public key,
//! 32-byte secret scalar). Identity keys sign published network records
//! (Ed25519, 32-byte public key, 32-byte private seed). Identity seeds are
//! hex-encoded at rest, so their encrypted form carries 64 bytes.
//!
//! The custody store never performs curve math itself; it holds these pairs
//! as opaque objects and asks them for their bytes.

use arx_types::{KeyId, SecureBytes};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use crate::hash::blake2b_256;

/// Ledger secret scalar size in bytes.
pub const LEDGER_SECRET_SIZE: usize = 32;
/// Identity private seed size in bytes (raw).
pub const IDENTITY_SEED_SIZE: usize = 32;
/// Identity private seed size at rest (hex-encoded).
pub const IDENTITY_SECRET_HEX_SIZE: usize = 64;

/// Errors arising from key construction and validation.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid ledger secret: {0}")]
    InvalidLedgerSecret(String),

    #[error("identity secret has wrong size: {0}")]
    InvalidIdentitySecretSize(usize),

    #[error("identity secret is not valid hex")]
    InvalidIdentityHex,

    #[error("secret does not match the expected public key")]
    PublicKeyMismatch,
}

/// Which of the two key families a piece of key material belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFamily {
    Ledger,
    Identity,
}

// ── Ledger keys (secp256k1) ─────────────────────────────────────────────

/// A transaction-signing key pair.
#[derive(Clone)]
pub struct LedgerKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl LedgerKeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut rand::thread_rng());
        Self { secret, public }
    }

    /// Rebuild a key pair from a 32-byte secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| KeyError::InvalidLedgerSecret(e.to_string()))?;
        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self { secret, public })
    }

    /// Rebuild from decrypted secret material and require that the derived
    /// public key matches the one stored alongside the ciphertext.
    pub fn from_secret_checked(secret: &[u8], expected_public: &[u8]) -> Result<Self, KeyError> {
        let pair = Self::from_secret_bytes(secret)?;
        if pair.public_bytes() != expected_public {
            return Err(KeyError::PublicKeyMismatch);
        }
        Ok(pair)
    }

    /// Compressed SEC1 encoding, 33 bytes.
    pub fn public_bytes(&self) -> Vec<u8> {
        self.public.serialize().to_vec()
    }

    /// The 32-byte secret scalar — the at-rest plaintext for this family.
    pub fn secret_bytes(&self) -> SecureBytes {
        SecureBytes::from(self.secret.secret_bytes().to_vec())
    }

    pub fn key_id(&self) -> KeyId {
        KeyId::from_public(&self.public_bytes())
    }
}

impl Drop for LedgerKeyPair {
    fn drop(&mut self) {
        // the identity family's SigningKey zeroizes itself; secp256k1
        // scalars need the explicit erase call
        self.secret.non_secure_erase();
    }
}

// ── Identity keys (Ed25519) ─────────────────────────────────────────────

/// A network-identity key pair, used to sign published records.
#[derive(Clone)]
pub struct IdentityKeyPair {
    signing: SigningKey,
}

impl IdentityKeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a key pair from a 32-byte private seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; IDENTITY_SEED_SIZE] = seed
            .try_into()
            .map_err(|_| KeyError::InvalidIdentitySecretSize(seed.len()))?;
        Ok(Self {
            signing: SigningKey::from_bytes(&arr),
        })
    }

    /// Rebuild from decrypted at-rest material (64 hex bytes) and require
    /// that the derived public key matches the stored one.
    pub fn from_secret_checked(secret: &[u8], expected_public: &[u8]) -> Result<Self, KeyError> {
        if secret.len() != IDENTITY_SECRET_HEX_SIZE {
            return Err(KeyError::InvalidIdentitySecretSize(secret.len()));
        }
        let text = std::str::from_utf8(secret).map_err(|_| KeyError::InvalidIdentityHex)?;
        let seed = hex::decode(text).map_err(|_| KeyError::InvalidIdentityHex)?;
        let pair = Self::from_seed(&seed)?;
        if pair.public_bytes() != expected_public {
            return Err(KeyError::PublicKeyMismatch);
        }
        Ok(pair)
    }

    /// Ed25519 public key, 32 bytes.
    pub fn public_bytes(&self) -> Vec<u8> {
        self.signing.verifying_key().to_bytes().to_vec()
    }

    /// Raw 32-byte private seed.
    pub fn seed_bytes(&self) -> SecureBytes {
        SecureBytes::from(self.signing.to_bytes().to_vec())
    }

    /// Hex-encoded private seed — the at-rest plaintext for this family.
    pub fn secret_hex(&self) -> SecureBytes {
        SecureBytes::from(hex::encode(self.signing.to_bytes()).into_bytes())
    }

    pub fn key_id(&self) -> KeyId {
        KeyId::from_public(&self.public_bytes())
    }

    /// Sign a record payload with this identity.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}

// ── Tagged key material ─────────────────────────────────────────────────

/// Private-key material of either family, presented uniformly.
///
/// The custody store's encrypt/decrypt/unlock logic runs once over this
/// abstraction; only the at-rest byte format differs per family.
pub enum KeyMaterial {
    Ledger(LedgerKeyPair),
    Identity(IdentityKeyPair),
}

impl KeyMaterial {
    pub fn family(&self) -> KeyFamily {
        match self {
            KeyMaterial::Ledger(_) => KeyFamily::Ledger,
            KeyMaterial::Identity(_) => KeyFamily::Identity,
        }
    }

    pub fn public_bytes(&self) -> Vec<u8> {
        match self {
            KeyMaterial::Ledger(pair) => pair.public_bytes(),
            KeyMaterial::Identity(pair) => pair.public_bytes(),
        }
    }

    /// Private material in the family's at-rest format: the 32-byte scalar
    /// for ledger keys, the 64-byte hex seed for identity keys.
    pub fn secret_bytes(&self) -> SecureBytes {
        match self {
            KeyMaterial::Ledger(pair) => pair.secret_bytes(),
            KeyMaterial::Identity(pair) => pair.secret_hex(),
        }
    }

    /// Blake2b-256 of the public key bytes; the per-key IV is its first half.
    pub fn identity_hash(&self) -> [u8; 32] {
        blake2b_256(&self.public_bytes())
    }

    pub fn key_id(&self) -> KeyId {
        KeyId::from_public(&self.public_bytes())
    }

    /// Validate decrypted secret material for the given family against the
    /// public key that accompanied the ciphertext.
    pub fn from_secret_checked(
        family: KeyFamily,
        secret: &[u8],
        expected_public: &[u8],
    ) -> Result<Self, KeyError> {
        match family {
            KeyFamily::Ledger => {
                LedgerKeyPair::from_secret_checked(secret, expected_public).map(KeyMaterial::Ledger)
            }
            KeyFamily::Identity => IdentityKeyPair::from_secret_checked(secret, expected_public)
                .map(KeyMaterial::Identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_roundtrip_through_secret_bytes() {
        let pair = LedgerKeyPair::generate();
        let rebuilt = LedgerKeyPair::from_secret_bytes(pair.secret_bytes().as_slice()).unwrap();
        assert_eq!(pair.public_bytes(), rebuilt.public_bytes());
    }

    #[test]
    fn ledger_public_is_compressed() {
        let pair = LedgerKeyPair::generate();
        assert_eq!(pair.public_bytes().len(), 33);
    }

    #[test]
    fn ledger_checked_rejects_foreign_public() {
        let a = LedgerKeyPair::generate();
        let b = LedgerKeyPair::generate();
        let result = LedgerKeyPair::from_secret_checked(
            a.secret_bytes().as_slice(),
            &b.public_bytes(),
        );
        assert!(matches!(result, Err(KeyError::PublicKeyMismatch)));
    }

    #[test]
    fn identity_roundtrip_through_hex() {
        let pair = IdentityKeyPair::generate();
        let rebuilt = IdentityKeyPair::from_secret_checked(
            pair.secret_hex().as_slice(),
            &pair.public_bytes(),
        )
        .unwrap();
        assert_eq!(pair.seed_bytes(), rebuilt.seed_bytes());
    }

    #[test]
    fn identity_hex_secret_is_64_bytes() {
        let pair = IdentityKeyPair::generate();
        assert_eq!(pair.secret_hex().len(), IDENTITY_SECRET_HEX_SIZE);
        assert_eq!(pair.seed_bytes().len(), IDENTITY_SEED_SIZE);
    }

    #[test]
    fn identity_checked_rejects_raw_seed() {
        // at-rest format is hex; a raw 32-byte seed must be refused
        let pair = IdentityKeyPair::generate();
        let result = IdentityKeyPair::from_secret_checked(
            pair.seed_bytes().as_slice(),
            &pair.public_bytes(),
        );
        assert!(matches!(
            result,
            Err(KeyError::InvalidIdentitySecretSize(32))
        ));
    }

    #[test]
    fn identity_sign_is_deterministic() {
        let pair = IdentityKeyPair::from_seed(&[7u8; 32]).unwrap();
        assert_eq!(pair.sign(b"record"), pair.sign(b"record"));
    }

    #[test]
    fn key_material_ids_match_family_pairs() {
        let ledger = LedgerKeyPair::generate();
        let id = ledger.key_id();
        let material = KeyMaterial::Ledger(ledger);
        assert_eq!(material.key_id(), id);
        assert_eq!(material.family(), KeyFamily::Ledger);
    }

    #[test]
    fn key_material_iv_source_is_public_hash() {
        let identity = IdentityKeyPair::generate();
        let public = identity.public_bytes();
        let material = KeyMaterial::Identity(identity);
        assert_eq!(material.identity_hash(), crate::hash::blake2b_256(&public));
    }

    #[test]
    fn distinct_keys_have_distinct_identity_hashes() {
        let a = KeyMaterial::Identity(IdentityKeyPair::generate());
        let b = KeyMaterial::Identity(IdentityKeyPair::generate());
        assert_ne!(a.identity_hash(), b.identity_hash());
    }
}
