use arx_crypto::{CipherError, KeyError};
use arx_types::KeyId;
use thiserror::Error;

/// Errors surfaced by the custody stores.
///
/// Everything except [`KeystoreError::Corrupted`] is an ordinary reportable
/// outcome: the store is left exactly as it was before the call and the
/// caller may correct its input and retry. `Corrupted` means stored state is
/// internally inconsistent and the session must not keep operating on it.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("plaintext keys still resident; cannot enter encrypted mode")]
    PlaintextKeysResident,

    #[error("store already holds encrypted records")]
    AlreadyEncrypted,

    #[error("store is not in encrypted mode")]
    NotEncrypted,

    #[error("store is locked")]
    Locked,

    #[error("unknown key: {0}")]
    UnknownKey(KeyId),

    /// Wrong passphrase-derived master key. Recoverable; prompt and retry.
    #[error("master key failed verification")]
    WrongMasterKey,

    /// Some records decrypt under the offered master key while siblings do
    /// not. That combination is only possible when the stored records are
    /// already inconsistent, so this is an integrity violation, not an
    /// authentication failure.
    #[error("key store integrity violation: some keys decrypt but not all")]
    Corrupted,

    #[error("hd chain id does not match its seed hash")]
    HdChainIdMismatch,

    #[error("no hd chain present")]
    NoHdChain,

    #[error("hd chain is already encrypted")]
    HdChainCrypted,

    #[error("hd chain is not encrypted")]
    HdChainNotCrypted,

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Key(#[from] KeyError),
}
