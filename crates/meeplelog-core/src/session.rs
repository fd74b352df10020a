//! Session-aware state over the credential store and API client
//!
//! Thin consumer layer the UI reads: is the user authenticated, and do they
//! have a match still in progress.

use serde::Deserialize;
use tracing::debug;

use crate::api::ApiClient;
use crate::credentials::CredentialStore;
use crate::error::{ClientError, Result};

/// Summary of a play session still in progress
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenMatch {
    pub id: String,
    pub game_title: String,
    pub started_at: String,
}

/// Session state reader for the host application
#[derive(Clone)]
pub struct SessionTracker {
    api: ApiClient,
    credentials: CredentialStore,
}

impl SessionTracker {
    /// Create a tracker over the shared client and credential store
    pub fn new(api: ApiClient, credentials: CredentialStore) -> Self {
        Self { api, credentials }
    }

    /// Whether a complete credential record is stored
    pub async fn is_authenticated(&self) -> Result<bool> {
        self.credentials.is_authenticated().await
    }

    /// The user's in-progress match, if the backend has one
    ///
    /// Returns `None` when no credentials are stored or the backend answers
    /// 404 (no open match).
    pub async fn open_match(&self) -> Result<Option<OpenMatch>> {
        let Some(token) = self.credentials.token().await? else {
            debug!("No stored token, skipping open-match lookup");
            return Ok(None);
        };

        match self.api.get("matches/open", Some(&token)).await {
            Ok(value) => Ok(Some(serde_json::from_value(value)?)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Explicit logout: destroy the credential record
    pub async fn logout(&self) -> Result<()> {
        self.credentials.purge().await
    }
}
