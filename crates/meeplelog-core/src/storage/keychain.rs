//! OS keychain storage backend
//!
//! Uses the system keychain for secure storage:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)
//!
//! Values on this path are stored by the OS as-is; the application-level
//! encryption helper is only involved on the fallback path.

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::SecureStore;
use crate::error::{ClientError, Result};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "meeplelog";

/// OS keychain storage backend
pub struct KeychainStore {
    /// Prefix for all keys (for namespacing)
    prefix: String,
    /// Whether the keychain is available
    available: bool,
}

impl KeychainStore {
    /// Create a new keychain store with an optional namespace prefix
    pub fn new(prefix: Option<&str>) -> Self {
        let prefix = prefix.map(|p| format!("{}-", p)).unwrap_or_default();

        let available = Self::probe_availability();

        if available {
            debug!("Keychain storage is available");
        } else {
            warn!("Keychain storage is not available - will use fallback");
        }

        Self { prefix, available }
    }

    /// Probe the keychain with a set/delete round-trip
    fn probe_availability() -> bool {
        match Entry::new(SERVICE_NAME, "__probe__") {
            Ok(entry) => {
                if entry.set_password("probe").is_ok() {
                    let _ = entry.delete_password();
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        let full_key = format!("{}{}", self.prefix, key);
        Entry::new(SERVICE_NAME, &full_key).map_err(|e| ClientError::Keychain(e.to_string()))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(ClientError::Keychain("Keychain not available".to_string()))
        }
    }

    /// Check if the keychain is available
    pub fn is_available(&self) -> bool {
        self.available
    }
}

#[async_trait]
impl SecureStore for KeychainStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_available()?;

        match self.entry(key)?.get_password() {
            Ok(value) => {
                debug!("Retrieved key from keychain: {}", key);
                Ok(Some(value))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Key not found in keychain: {}", key);
                Ok(None)
            }
            Err(e) => Err(ClientError::Keychain(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_available()?;

        self.entry(key)?
            .set_password(value)
            .map_err(|e| ClientError::Keychain(e.to_string()))?;

        debug!("Stored key in keychain: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.ensure_available()?;

        match self.entry(key)?.delete_password() {
            Ok(()) => {
                debug!("Deleted key from keychain: {}", key);
                Ok(())
            }
            // Key doesn't exist, that's fine
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ClientError::Keychain(e.to_string())),
        }
    }

    fn is_hardware_backed(&self) -> bool {
        // OS keychains use OS-level protection (Secure Enclave on macOS,
        // DPAPI on Windows), so we treat them all as hardware-backed.
        self.available
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}
