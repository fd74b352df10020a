//! Storage trait definitions

use async_trait::async_trait;

use crate::error::Result;

/// Uniform asynchronous string-keyed storage contract
///
/// Backends are selected once at composition time; call sites never branch
/// on the platform. Batch operations share the per-key semantics of the
/// singular forms. No ordering is guaranteed between concurrent calls and
/// same-key writes are last-write-wins.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Retrieve a value, `None` if the key was never written or was removed
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Persist a value under the given key
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Retrieve several keys, preserving input order
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<(String, Option<String>)>> {
        let mut out = Vec::with_capacity(keys.len());
        for &key in keys {
            out.push((key.to_string(), self.get(key).await?));
        }
        Ok(out)
    }

    /// Persist several key/value pairs
    ///
    /// Backends that can apply the batch as a single write override this;
    /// the default applies entries sequentially.
    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        for &(key, value) in pairs {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Delete each named key, leaving all other keys untouched
    async fn clear_keys(&self, keys: &[&str]) -> Result<()> {
        for &key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Check if this storage backend is hardware-backed
    fn is_hardware_backed(&self) -> bool;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
