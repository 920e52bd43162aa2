//! Secure byte buffers that are wiped when released.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the session master key in bytes.
pub const MASTER_KEY_SIZE: usize = 32;

/// A variable-length secret buffer, zeroized on drop.
///
/// Used for private scalars, seeds, mnemonics, and decrypted key material.
/// Intentionally does not implement `Serialize` and hides its contents from
/// `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes(Vec<u8>);

impl SecureBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes({} bytes)", self.0.len())
    }
}

/// The session symmetric key that unlocks all encrypted records.
///
/// Memory-only: its presence in the store is the sole unlock signal, and the
/// buffer is wiped whenever the store locks or the key is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_SIZE]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; MASTER_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a master key from a derived secret; fails on wrong size.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; MASTER_KEY_SIZE] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_does_not_leak_contents() {
        let secret = SecureBytes::from(vec![0xAB; 16]);
        assert_eq!(format!("{:?}", secret), "SecureBytes(16 bytes)");

        let master = MasterKey::from_bytes([0xCD; 32]);
        assert_eq!(format!("{:?}", master), "MasterKey(..)");
    }

    #[test]
    fn master_key_from_slice_checks_length() {
        assert!(MasterKey::from_slice(&[0u8; 32]).is_some());
        assert!(MasterKey::from_slice(&[0u8; 31]).is_none());
        assert!(MasterKey::from_slice(&[0u8; 64]).is_none());
    }

    #[test]
    fn secure_bytes_equality() {
        let a = SecureBytes::from(vec![1, 2, 3]);
        let b = SecureBytes::from(vec![1, 2, 3]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert!(!a.is_empty());
    }
}
