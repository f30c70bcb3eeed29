//! Token Types
//!
//! Access token and token endpoint response definitions.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;

use super::scope::{ScopeSet, RESERVED_SCOPES};

/// Token response from authorization server.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// ID token (OIDC).
    #[serde(default)]
    pub id_token: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Instant `secs` seconds from now, saturating at `DateTime::<Utc>::MAX_UTC`.
fn expiry_after(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Bearer credential bound to a scope set.
#[derive(Clone)]
pub struct AccessToken {
    /// Token value (secret).
    value: SecretString,
    /// Token type.
    pub token_type: String,
    /// Expiration time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes the token is valid for.
    pub scopes: ScopeSet,
}

impl AccessToken {
    /// Create new access token.
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        scopes: ScopeSet,
    ) -> Self {
        Self {
            value: SecretString::new(value.into()),
            token_type: token_type.into(),
            expires_at,
            scopes,
        }
    }

    /// Bearer token helper.
    pub fn bearer(value: impl Into<String>, scopes: ScopeSet) -> Self {
        Self::new(value, "Bearer", None, scopes)
    }

    /// Build from a token endpoint response.
    ///
    /// Granted scopes come from the response's `scope` (reserved OIDC
    /// scopes removed), falling back to `requested` when absent. Lifetimes
    /// past chrono's range are clamped to the latest representable instant.
    pub fn from_response(response: &TokenResponse, requested: &ScopeSet) -> Self {
        let expires_at = response.expires_in.map(expiry_after);

        let granted = response
            .scope
            .as_deref()
            .map(|s| {
                s.split_whitespace()
                    .filter(|scope| {
                        !RESERVED_SCOPES
                            .iter()
                            .any(|reserved| reserved.eq_ignore_ascii_case(scope))
                    })
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .and_then(|scopes| ScopeSet::new(scopes).ok())
            .unwrap_or_else(|| requested.clone());

        Self {
            value: SecretString::new(response.access_token.clone()),
            token_type: response.token_type.clone(),
            expires_at,
            scopes: granted,
        }
    }

    /// Get token value (for Authorization header).
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Check if token expires within `buffer`.
    pub fn is_expiring_within(&self, buffer: std::time::Duration) -> bool {
        let limit = Duration::from_std(buffer)
            .ok()
            .and_then(|buffer| Utc::now().checked_add_signed(buffer));
        match (self.expires_at, limit) {
            (Some(exp), Some(limit)) => exp <= limit,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.value.expose_secret())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}
