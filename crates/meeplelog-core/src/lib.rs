//! # meeplelog-core
//!
//! Client core for Meeplelog, a board-game play-session tracker:
//! - Resilient API client with bounded retry and transparent session-expiry
//!   interception
//! - Secure key-value storage with OS keychain and encrypted-file backends
//! - AES-256-GCM encryption with Argon2id key derivation for the fallback
//!   path
//! - Credential record lifecycle (login, authenticated reads, purge)
//!
//! Composition happens once at startup: read [`Config`] from the
//! environment, pick a storage backend with [`storage::default_store`], wrap
//! it in a [`CredentialStore`], and hand both to [`ApiClient::from_config`]
//! together with the host application's [`SessionExpiryHandler`].

pub mod api;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiClientConfig, SessionExpiryHandler, SESSION_INVALID_PATTERNS};
pub use config::{AppMode, Config};
pub use credentials::{CredentialStore, TOKEN_KEY, USER_ID_KEY};
pub use crypto::{decrypt_string, derive_key, encrypt_string, generate_salt, CipherKey, SecretString};
pub use error::{ClientError, Result};
pub use session::{OpenMatch, SessionTracker};
pub use storage::{default_store, EncryptedFileStore, KeychainStore, SecureStore};
