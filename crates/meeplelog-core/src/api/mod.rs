//! Resilient API access with transparent credential lifecycle management
//!
//! [`ApiClient`] is the single configuration point for backend HTTP traffic:
//! base URL, timeout, retry policy, and the session-expiry interception that
//! purges stored credentials and hands control to the host application.

mod client;
mod expiry;

pub use client::{ApiClient, ApiClientConfig};
pub use expiry::{SessionExpiryHandler, SESSION_INVALID_PATTERNS};
