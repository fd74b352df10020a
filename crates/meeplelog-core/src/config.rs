//! Process-wide configuration
//!
//! Read once at startup from the environment. The backend base URL and the
//! storage secret are mandatory: initialization fails rather than letting the
//! client run without them.

use url::Url;

use crate::crypto::SecretString;
use crate::error::{ClientError, Result};

/// Environment variable holding the backend base URL
pub const ENV_API_URL: &str = "MEEPLELOG_API_URL";
/// Environment variable holding the fallback-store encryption secret
pub const ENV_STORAGE_SECRET: &str = "MEEPLELOG_STORAGE_SECRET";
/// Environment variable selecting the application mode
pub const ENV_APP_MODE: &str = "MEEPLELOG_APP_MODE";

/// Application mode, gates verbose logging only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    Development,
    #[default]
    Production,
}

impl AppMode {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => AppMode::Development,
            _ => AppMode::Production,
        }
    }
}

/// Client configuration, fixed for the process lifetime
#[derive(Debug)]
pub struct Config {
    /// Backend base URL
    pub api_url: Url,
    /// Symmetric secret for the encrypted-fallback storage path
    pub storage_secret: SecretString,
    /// Application mode
    pub app_mode: AppMode,
}

impl Config {
    /// Build a configuration from explicit values, validating both
    pub fn new(api_url: &str, storage_secret: &str) -> Result<Self> {
        if storage_secret.is_empty() {
            return Err(ClientError::Config(
                "storage secret must not be empty".to_string(),
            ));
        }

        let api_url = Url::parse(api_url)
            .map_err(|e| ClientError::Config(format!("invalid API base URL: {}", e)))?;

        Ok(Self {
            api_url,
            storage_secret: SecretString::new(storage_secret.to_string()),
            app_mode: AppMode::default(),
        })
    }

    /// Read the configuration from the environment
    ///
    /// Fails if `MEEPLELOG_API_URL` or `MEEPLELOG_STORAGE_SECRET` is absent.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_STORAGE_SECRET).ok(),
            std::env::var(ENV_APP_MODE).ok(),
        )
    }

    fn from_vars(
        api_url: Option<String>,
        storage_secret: Option<String>,
        app_mode: Option<String>,
    ) -> Result<Self> {
        let api_url = api_url
            .ok_or_else(|| ClientError::Config(format!("{} is not set", ENV_API_URL)))?;
        let storage_secret = storage_secret
            .ok_or_else(|| ClientError::Config(format!("{} is not set", ENV_STORAGE_SECRET)))?;

        let mut config = Self::new(&api_url, &storage_secret)?;
        if let Some(mode) = app_mode {
            config.app_mode = AppMode::parse(&mode);
        }

        Ok(config)
    }
}
