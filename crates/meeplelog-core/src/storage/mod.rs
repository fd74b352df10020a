//! Secure key-value storage for credentials and user preferences
//!
//! Two backends behind one contract:
//! 1. OS keychain (hardware-backed where available)
//! 2. Encrypted file (fallback)
//!
//! The backend is chosen once at composition time; see [`default_store`].

mod encrypted_file;
mod keychain;
mod traits;

use std::sync::Arc;

use tracing::{info, warn};

use crate::crypto::SecretString;
use crate::error::Result;

pub use encrypted_file::EncryptedFileStore;
pub use keychain::KeychainStore;
pub use traits::SecureStore;

/// Select the strongest available backend for this host
///
/// Probes the OS keychain once; when it is unusable (headless Linux without
/// a secret service, locked-down CI) falls back to the encrypted file store
/// keyed by the configured secret.
pub fn default_store(secret: &SecretString) -> Result<Arc<dyn SecureStore>> {
    let keychain = KeychainStore::new(None);

    if keychain.is_available() {
        info!("Using storage backend: {}", keychain.backend_name());
        return Ok(Arc::new(keychain));
    }

    warn!("Keychain unavailable, falling back to encrypted file storage");
    let fallback = EncryptedFileStore::new(secret)?;
    info!("Using storage backend: {}", fallback.backend_name());
    Ok(Arc::new(fallback))
}
