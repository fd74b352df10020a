//! Resilient HTTP client for the Meeplelog backend
//!
//! One explicitly constructed client object carries the base URL, timeout,
//! retry policy, and the session-expiry reaction. Transport failures are
//! retried with exponential backoff below the expiry interceptor; HTTP
//! status errors are never retried. The client attaches no Authorization
//! header on its own - call sites pass the bearer token they read from the
//! credential store.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::expiry::{self, SessionExpiryHandler};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{ClientError, Result};

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default maximum number of automatic retries per request
const DEFAULT_MAX_RETRIES: u32 = 5;
/// Default base delay for exponential backoff
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(300);
/// Backoff ceiling
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// API client configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Backend base URL
    pub base_url: url::Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum automatic retries per request (on top of the first attempt)
    pub max_retries: u32,
    /// Base delay for exponential backoff between attempts
    pub backoff_base: Duration,
}

impl ApiClientConfig {
    /// Create a configuration with default timeout and retry policy
    pub fn new(base_url: url::Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry cap
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff base delay
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }
}

/// Shared HTTP client for the whole application
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiClientConfig,
    credentials: CredentialStore,
    expiry_handler: Arc<dyn SessionExpiryHandler>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("timeout", &self.config.timeout)
            .field("max_retries", &self.config.max_retries)
            .finish()
    }
}

impl ApiClient {
    /// Create a client with an explicit configuration
    pub fn new(
        config: ApiClientConfig,
        credentials: CredentialStore,
        expiry_handler: Arc<dyn SessionExpiryHandler>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            credentials,
            expiry_handler,
        })
    }

    /// Create a client from the process configuration, with the default
    /// timeout and retry policy
    pub fn from_config(
        config: &Config,
        credentials: CredentialStore,
        expiry_handler: Arc<dyn SessionExpiryHandler>,
    ) -> Result<Self> {
        Self::new(
            ApiClientConfig::new(config.api_url.clone()),
            credentials,
            expiry_handler,
        )
    }

    /// `GET` a relative path
    pub async fn get(&self, path: &str, bearer: Option<&str>) -> Result<Value> {
        self.request(Method::GET, path, None, bearer, &[]).await
    }

    /// `POST` a JSON body to a relative path
    pub async fn post(&self, path: &str, body: &Value, bearer: Option<&str>) -> Result<Value> {
        self.request(Method::POST, path, Some(body), bearer, &[])
            .await
    }

    /// `PUT` a JSON body to a relative path
    pub async fn put(&self, path: &str, body: &Value, bearer: Option<&str>) -> Result<Value> {
        self.request(Method::PUT, path, Some(body), bearer, &[])
            .await
    }

    /// `DELETE` a relative path
    pub async fn delete(&self, path: &str, bearer: Option<&str>) -> Result<Value> {
        self.request(Method::DELETE, path, None, bearer, &[]).await
    }

    /// Issue a request with optional body, bearer token, and extra headers
    ///
    /// Extra headers override the defaults per request (e.g. a multipart
    /// content type). Retries and expiry interception apply here for every
    /// verb method above.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        let url = self.config.base_url.join(path)?;

        let mut attempts = 0;
        let response = loop {
            attempts += 1;

            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, url = %url, attempt = attempts, "Sending request");

            match request.send().await {
                Ok(response) => break response,
                Err(e) if is_transient(&e) && attempts <= self.config.max_retries => {
                    let delay = backoff_delay(self.config.backoff_base, attempts);
                    warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Transient request failure, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(ClientError::Network {
                        attempts,
                        source: e,
                    })
                }
            }
        };

        let status = response.status();

        if status.is_success() {
            debug!(status = %status, url = %url, "Request succeeded");
            let text = response.text().await.unwrap_or_default();
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let body_text = response.text().await.unwrap_or_default();

        if expiry::is_session_invalid(&body_text) {
            warn!(status = %status, "Backend reported an invalid session, purging credentials");

            if let Err(e) = self.credentials.purge().await {
                error!("Failed to clear stored credentials: {}", e);
            }
            self.expiry_handler.on_session_expired().await;

            // The original error still reaches the caller's own handling
            return Err(ClientError::SessionExpired {
                status: status.as_u16(),
                body: body_text,
            });
        }

        debug!(status = %status, url = %url, "Request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            body: body_text,
        })
    }

    /// The configured base URL
    pub fn base_url(&self) -> &url::Url {
        &self.config.base_url
    }
}

/// Whether a transport error is worth retrying
///
/// Timeouts and connection failures only; HTTP status errors never reach
/// this check because `send()` succeeds for them.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}
