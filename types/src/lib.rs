//! Fundamental types for the Arx wallet custody core.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: key identities, secure (wipe-on-drop) byte buffers, and the
//! session master key.

pub mod keys;
pub mod secret;

pub use keys::KeyId;
pub use secret::{MasterKey, SecureBytes, MASTER_KEY_SIZE};
