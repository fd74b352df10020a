//! Credential record lifecycle over the secure store
//!
//! The credential record is the `token` + `userId` pair identifying an
//! authenticated session. Absence of either key means "not authenticated".
//! Login writes go through the batch primitive so the pair is never
//! half-written; user preference strings share the store but are untouched
//! by a credential purge.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::storage::SecureStore;

/// Storage key for the session token
pub const TOKEN_KEY: &str = "token";
/// Storage key for the authenticated user id
pub const USER_ID_KEY: &str = "userId";

/// Credential record access over a shared secure store
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn SecureStore>,
}

impl CredentialStore {
    /// Create a credential store over the given backend
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    /// Persist a fresh login as a single batch write
    pub async fn store_login(&self, token: &str, user_id: &str) -> Result<()> {
        self.store
            .set_many(&[(TOKEN_KEY, token), (USER_ID_KEY, user_id)])
            .await?;

        info!("Stored login credentials for user {}", user_id);
        Ok(())
    }

    /// The stored session token, if any
    pub async fn token(&self) -> Result<Option<String>> {
        self.store.get(TOKEN_KEY).await
    }

    /// The stored user id, if any
    pub async fn user_id(&self) -> Result<Option<String>> {
        self.store.get(USER_ID_KEY).await
    }

    /// Whether a complete credential record is present
    pub async fn is_authenticated(&self) -> Result<bool> {
        let values = self.store.get_many(&[TOKEN_KEY, USER_ID_KEY]).await?;
        Ok(values.iter().all(|(_, v)| v.is_some()))
    }

    /// Remove the credential record, leaving preferences intact
    ///
    /// Called on explicit logout and by the API client when the backend
    /// reports an invalid session.
    pub async fn purge(&self) -> Result<()> {
        self.store.clear_keys(&[TOKEN_KEY, USER_ID_KEY]).await?;
        info!("Purged stored credentials");
        Ok(())
    }

    /// Persist a user preference string
    pub async fn set_preference(&self, name: &str, value: &str) -> Result<()> {
        debug!("Storing preference: {}", name);
        self.store.set(name, value).await
    }

    /// Read a user preference string
    pub async fn preference(&self, name: &str) -> Result<Option<String>> {
        self.store.get(name).await
    }
}
