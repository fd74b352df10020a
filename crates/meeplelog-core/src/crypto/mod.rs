//! Cryptographic primitives for the encrypted storage fallback
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - Argon2id key derivation from the configured secret
//! - Secure memory handling with zeroize

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{decrypt_string, encrypt_string, EncryptedValue};
pub use key_derivation::{derive_key, generate_salt, KdfParams};
pub use secure_memory::{CipherKey, SecretString};
