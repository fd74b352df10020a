//! Session-expiry detection and reaction hook
//!
//! The backend signals an invalid or expired session through its error
//! message body rather than a dedicated status code. The substring contract
//! below matches that body verbatim for compatibility; see DESIGN.md for why
//! it is preserved rather than replaced with a status-code check.

use async_trait::async_trait;

/// Message substrings the backend uses to signal an invalid session
/// (case-insensitive match)
pub const SESSION_INVALID_PATTERNS: [&str; 2] = ["token inválido", "jwt"];

/// Host-application hook invoked once when the backend invalidates the
/// session
///
/// Implementations typically navigate to the landing route and surface a
/// user-visible notification. Credential purging happens in the client
/// before this fires; the handler never needs to touch the store.
#[async_trait]
pub trait SessionExpiryHandler: Send + Sync {
    async fn on_session_expired(&self);
}

/// Check an error response body for the invalid-session signal
///
/// Prefers the `msg` field of a JSON body; a body that is not JSON (or has
/// no `msg` field) is matched as raw text, mirroring the loose contract the
/// backend actually implements.
pub(crate) fn is_session_invalid(body: &str) -> bool {
    let msg = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("msg").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.to_string());

    let msg = msg.to_lowercase();
    SESSION_INVALID_PATTERNS
        .iter()
        .any(|pattern| msg.contains(pattern))
}
