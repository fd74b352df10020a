//! Encrypted file storage backend
//!
//! Fallback for hosts without a usable OS keychain. Entries live in a JSON
//! file in the user's data directory, each value individually encrypted with
//! AES-256-GCM under a key derived from the configured storage secret and a
//! salt persisted next to the data file. A decrypt failure (corrupt entry,
//! changed secret) propagates to the caller instead of reading as absent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::SecureStore;
use crate::crypto::{decrypt_string, derive_key, encrypt_string, generate_salt, CipherKey, KdfParams, SecretString};
use crate::error::{ClientError, Result};

const STORE_FILE: &str = "store.json";
const SALT_FILE: &str = "salt";

/// Encrypted file storage backend
pub struct EncryptedFileStore {
    /// Directory holding the store and salt files
    storage_dir: PathBuf,
    /// Map of key -> encrypted value
    cache: Arc<RwLock<HashMap<String, String>>>,
    /// Derived encryption key
    key: CipherKey,
}

/// On-disk envelope
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    entries: HashMap<String, String>,
}

impl EncryptedFileStore {
    /// Create a store in the platform data directory
    pub fn new(secret: &SecretString) -> Result<Self> {
        let storage_dir = Self::default_storage_dir()?;
        Self::with_dir(storage_dir, secret, None)
    }

    /// Create a store in a custom directory (used by tests)
    pub fn with_dir(
        storage_dir: PathBuf,
        secret: &SecretString,
        kdf_params: Option<KdfParams>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;

        let salt = Self::load_or_create_salt(&storage_dir)?;
        let key = derive_key(secret.expose(), &salt, kdf_params)?;
        let entries = Self::load_entries(&storage_dir)?;

        debug!(
            "Encrypted file storage initialized at {:?} with {} entries",
            storage_dir,
            entries.len()
        );

        Ok(Self {
            storage_dir,
            cache: Arc::new(RwLock::new(entries)),
            key,
        })
    }

    fn default_storage_dir() -> Result<PathBuf> {
        ProjectDirs::from("app", "meeplelog", "meeplelog")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| ClientError::Storage("Could not determine data directory".to_string()))
    }

    fn store_file_path(&self) -> PathBuf {
        self.storage_dir.join(STORE_FILE)
    }

    /// Load the persisted salt, generating and saving one on first run
    fn load_or_create_salt(storage_dir: &std::path::Path) -> Result<String> {
        let path = storage_dir.join(SALT_FILE);

        if path.exists() {
            let salt = std::fs::read_to_string(&path)?;
            return Ok(salt.trim().to_string());
        }

        let salt = generate_salt();
        std::fs::write(&path, &salt)?;
        debug!("Generated new storage salt at {:?}", path);
        Ok(salt)
    }

    fn load_entries(storage_dir: &std::path::Path) -> Result<HashMap<String, String>> {
        let path = storage_dir.join(STORE_FILE);

        if !path.exists() {
            debug!("No existing store file found");
            return Ok(HashMap::new());
        }

        let contents = std::fs::read_to_string(&path)?;
        let file: StoreFile = serde_json::from_str(&contents)?;
        Ok(file.entries)
    }

    /// Persist the cache, atomically via a temp file rename
    async fn save(&self) -> Result<()> {
        let cache = self.cache.read().await;
        let file = StoreFile {
            version: 1,
            entries: cache.clone(),
        };
        drop(cache);

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.store_file_path();

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} entries to storage", file.entries.len());
        Ok(())
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }
}

#[async_trait]
impl SecureStore for EncryptedFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cache = self.cache.read().await;

        match cache.get(key) {
            Some(encrypted) => {
                let plaintext = decrypt_string(encrypted, &self.key)?;
                debug!("Retrieved key: {}", key);
                Ok(Some(plaintext))
            }
            None => {
                debug!("Key not found: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let encrypted = encrypt_string(value, &self.key)?;

        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), encrypted);
        drop(cache);

        self.save().await?;

        debug!("Stored key: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut cache = self.cache.write().await;

        if cache.remove(key).is_some() {
            drop(cache);
            self.save().await?;
            debug!("Deleted key: {}", key);
        }

        Ok(())
    }

    /// Batch write as one cache mutation and one file write
    ///
    /// This is what makes atomic credential writes possible: either every
    /// pair in the batch reaches disk or none does.
    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut encrypted_pairs = Vec::with_capacity(pairs.len());
        for &(key, value) in pairs {
            encrypted_pairs.push((key.to_string(), encrypt_string(value, &self.key)?));
        }

        let mut cache = self.cache.write().await;
        for (key, encrypted) in encrypted_pairs {
            cache.insert(key, encrypted);
        }
        drop(cache);

        self.save().await?;

        debug!("Stored {} keys", pairs.len());
        Ok(())
    }

    async fn clear_keys(&self, keys: &[&str]) -> Result<()> {
        let mut cache = self.cache.write().await;
        let mut removed = false;
        for key in keys {
            removed |= cache.remove(*key).is_some();
        }
        drop(cache);

        if removed {
            self.save().await?;
            debug!("Cleared {} keys", keys.len());
        }

        Ok(())
    }

    fn is_hardware_backed(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "Encrypted File Storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_kdf() -> KdfParams {
        KdfParams {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn test_store(dir: &TempDir, secret: &str) -> EncryptedFileStore {
        EncryptedFileStore::with_dir(
            dir.path().to_path_buf(),
            &SecretString::new(secret.to_string()),
            Some(fast_kdf()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "secret");

        store.set("token", "abc123").await.unwrap();

        assert_eq!(store.get("token").await.unwrap(), Some("abc123".to_string()));
    }

    #[tokio::test]
    async fn test_get_unknown_key() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "secret");

        assert_eq!(store.get("never-written").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "secret");

        store.set("token", "abc123").await.unwrap();
        store.remove("token").await.unwrap();

        assert_eq!(store.get("token").await.unwrap(), None);

        // Removing a missing key is not an error
        store.remove("token").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_many_get_many() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "secret");

        store
            .set_many(&[("token", "abc123"), ("userId", "u1")])
            .await
            .unwrap();

        let values = store.get_many(&["token", "userId", "missing"]).await.unwrap();
        assert_eq!(
            values,
            vec![
                ("token".to_string(), Some("abc123".to_string())),
                ("userId".to_string(), Some("u1".to_string())),
                ("missing".to_string(), None),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_keys_leaves_others() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "secret");

        store
            .set_many(&[("token", "t"), ("userId", "u"), ("favoriteGame", "catan")])
            .await
            .unwrap();

        store.clear_keys(&["token", "userId"]).await.unwrap();

        assert_eq!(store.get("token").await.unwrap(), None);
        assert_eq!(store.get("userId").await.unwrap(), None);
        assert_eq!(
            store.get("favoriteGame").await.unwrap(),
            Some("catan".to_string())
        );
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let dir = TempDir::new().unwrap();

        {
            let store = test_store(&dir, "secret");
            store.set("token", "persisted").await.unwrap();
        }

        // Same directory and secret: the salt file makes the key stable
        let store = test_store(&dir, "secret");
        assert_eq!(
            store.get("token").await.unwrap(),
            Some("persisted".to_string())
        );
    }

    #[tokio::test]
    async fn test_changed_secret_invalidates_values() {
        let dir = TempDir::new().unwrap();

        {
            let store = test_store(&dir, "old-secret");
            store.set("token", "abc123").await.unwrap();
        }

        let store = test_store(&dir, "new-secret");
        let result = store.get("token").await;

        assert!(matches!(result, Err(ClientError::Decryption(_))));
    }

    #[tokio::test]
    async fn test_corrupted_value_propagates_decrypt_error() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "secret");

        store.set("token", "abc123").await.unwrap();

        // Corrupt the stored ciphertext directly
        {
            let mut cache = store.cache.write().await;
            cache.insert("token".to_string(), "not:valid:ciphertext".to_string());
        }

        assert!(matches!(
            store.get("token").await,
            Err(ClientError::Decryption(_))
        ));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "secret");

        store.set("token", "first").await.unwrap();
        store.set("token", "second").await.unwrap();

        assert_eq!(store.get("token").await.unwrap(), Some("second".to_string()));
    }
}
