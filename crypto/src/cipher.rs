//! AES-256-CBC crypter bound to one (key, IV) pair.
//!
//! Ciphertext length is the plaintext length rounded up to the 16-byte AES
//! block (PKCS#7, so an exact multiple gains one full pad block). There is
//! no authentication tag; integrity of key material is inferred by the
//! caller re-deriving the public key from the decrypted secret.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use arx_types::SecureBytes;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::kdf::{derive_key_iv, DerivationMethod, KdfError, KDF_IV_SIZE, KDF_KEY_SIZE};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes.
pub const CIPHER_BLOCK_SIZE: usize = 16;

/// Errors arising from the symmetric cipher.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("no key bound to the crypter")]
    KeyNotSet,

    #[error("key must be {KDF_KEY_SIZE} bytes and IV {KDF_IV_SIZE} bytes")]
    BadKeySize,

    #[error(transparent)]
    Kdf(#[from] KdfError),

    /// Wrong key, wrong IV, or mangled ciphertext — CBC cannot tell apart.
    #[error("decryption failed")]
    DecryptFailed,
}

/// Holds one (key, IV) pair and encrypts/decrypts opaque byte buffers.
///
/// Key material is wiped when the crypter is dropped or rebound.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Crypter {
    key: [u8; KDF_KEY_SIZE],
    iv: [u8; KDF_IV_SIZE],
    key_set: bool,
}

impl Crypter {
    pub fn new() -> Self {
        Self {
            key: [0u8; KDF_KEY_SIZE],
            iv: [0u8; KDF_IV_SIZE],
            key_set: false,
        }
    }

    /// Derive and bind a (key, IV) pair from a passphrase.
    pub fn set_key_from_passphrase(
        &mut self,
        passphrase: &[u8],
        salt: &[u8],
        rounds: u32,
        method: DerivationMethod,
    ) -> Result<(), CipherError> {
        let (key, iv) = derive_key_iv(passphrase, salt, rounds, method)?;
        self.key.copy_from_slice(key.as_slice());
        self.iv = iv;
        self.key_set = true;
        Ok(())
    }

    /// Bind an explicit (key, IV) pair. May rebind an already-keyed crypter.
    pub fn set_key(&mut self, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
        if key.len() != KDF_KEY_SIZE || iv.len() != KDF_IV_SIZE {
            return Err(CipherError::BadKeySize);
        }
        self.key.copy_from_slice(key);
        self.iv.copy_from_slice(iv);
        self.key_set = true;
        Ok(())
    }

    /// Encrypt a plaintext buffer. Fails closed when no key is bound.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if !self.key_set {
            return Err(CipherError::KeyNotSet);
        }
        let enc = Aes256CbcEnc::new(&self.key.into(), &self.iv.into());
        Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    /// Decrypt a ciphertext buffer; the exact inverse of [`Crypter::encrypt`].
    ///
    /// Returns the plaintext in a wipe-on-drop buffer. No partial output is
    /// exposed on failure.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<SecureBytes, CipherError> {
        if !self.key_set {
            return Err(CipherError::KeyNotSet);
        }
        let dec = Aes256CbcDec::new(&self.key.into(), &self.iv.into());
        let plaintext = dec
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::DecryptFailed)?;
        Ok(SecureBytes::from(plaintext))
    }
}

impl Default for Crypter {
    fn default() -> Self {
        Self::new()
    }
}
