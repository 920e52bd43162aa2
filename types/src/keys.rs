//! Key identity type used as the map key for both key families.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Stable identity of a public key: the 32-byte Blake2b hash of its bytes.
///
/// Both ledger (secp256k1) and identity (Ed25519) public keys map to a
/// `KeyId` the same way, so one id type serves both families.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId([u8; 32]);

impl KeyId {
    /// Compute the id of a public key from its serialized bytes.
    pub fn from_public(public: &[u8]) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update(public);
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        Self(output)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_public_same_id() {
        let a = KeyId::from_public(b"some public key bytes");
        let b = KeyId::from_public(b"some public key bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn different_public_different_id() {
        let a = KeyId::from_public(&[1u8; 33]);
        let b = KeyId::from_public(&[2u8; 33]);
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_full_hex() {
        let id = KeyId::from_public(&[0u8; 32]);
        assert_eq!(id.to_string().len(), 64);
    }

    proptest::proptest! {
        #[test]
        fn id_is_a_pure_function_of_public_bytes(
            public in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)
        ) {
            proptest::prop_assert_eq!(
                KeyId::from_public(&public),
                KeyId::from_public(&public)
            );
        }
    }
}
