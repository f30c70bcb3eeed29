//! Configuration Types
//!
//! Identity provider and discovery flow configuration.

use std::time::Duration;
use url::Url;

use super::scope::ScopeSet;
use crate::error::{ConfigurationError, DiscoveryError};

/// Default authority for work and school accounts.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/organizations";
/// Default redirect URI for desktop public clients.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";
/// Default primary API scopes.
pub const DEFAULT_PRIMARY_SCOPES: [&str; 2] = [
    "https://graph.microsoft.com/user.read",
    "https://graph.microsoft.com/sites.readwrite.all",
];
/// Default secondary consent hint, consolidated into the first prompt.
pub const DEFAULT_CONSENT_HINT_SCOPES: [&str; 1] =
    ["https://microsoft.sharepoint-df.com/allsites.manage"];
/// Default discovery endpoint on the primary API.
pub const DEFAULT_DISCOVERY_URL: &str =
    "https://graph.microsoft.com/v1.0/sites/root?$select=webUrl";
/// Default JSON field naming the secondary resource.
pub const DEFAULT_DISCOVERY_FIELD: &str = "webUrl";
/// Default scope suffix appended to the discovered resource.
pub const DEFAULT_RESOURCE_SCOPE_SUFFIX: &str = "allsites.manage";
/// Default path queried on the secondary resource.
pub const DEFAULT_SECONDARY_API_PATH: &str = "_api/web";
/// Default HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Cached tokens expiring within this window are not served silently.
pub const DEFAULT_EXPIRY_BUFFER_SECS: u64 = 300;

/// Identity provider settings for a public client.
#[derive(Clone, Debug)]
pub struct AuthorityConfig {
    /// Application (client) identifier.
    pub client_id: String,
    /// Authority URL, e.g. `https://login.microsoftonline.com/organizations`.
    pub authority: Url,
    /// Redirect URI registered for the client.
    pub redirect_uri: Url,
    /// HTTP timeout for token endpoint calls.
    pub timeout: Duration,
    /// Cached tokens expiring within this window are treated as absent.
    pub expiry_buffer: Duration,
}

impl AuthorityConfig {
    fn endpoint(&self, leaf: &str) -> String {
        format!(
            "{}/oauth2/v2.0/{}",
            self.authority.as_str().trim_end_matches('/'),
            leaf
        )
    }

    /// Token endpoint URL.
    pub fn token_endpoint(&self) -> String {
        self.endpoint("token")
    }

    /// Authorization endpoint URL.
    pub fn authorization_endpoint(&self) -> String {
        self.endpoint("authorize")
    }

    /// Authority host, recorded as the account environment.
    pub fn environment(&self) -> Option<&str> {
        self.authority.host_str()
    }
}

/// Settings of the two-phase discovery flow.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// Scopes for the primary API.
    pub primary_scopes: ScopeSet,
    /// Secondary scopes consolidated into the first prompt (may be empty).
    pub consent_hint_scopes: Vec<String>,
    /// Primary API endpoint returning the secondary resource identifier.
    pub discovery_url: Url,
    /// JSON field holding the identifier.
    pub discovery_field: String,
    /// Suffix appended as `<resource>/<suffix>` to form the secondary scope.
    pub resource_scope_suffix: String,
    /// Path of the secondary API call, relative to the discovered resource.
    pub secondary_api_path: String,
}

impl FlowConfig {
    /// Scope string for a resource under the configured suffix.
    pub fn resource_scope(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            resource.trim_end_matches('/'),
            self.resource_scope_suffix
        )
    }

    /// URL of the secondary API call for a resource.
    pub fn secondary_api_url(&self, resource: &str) -> Result<String, DiscoveryError> {
        let url = format!(
            "{}/{}",
            resource.trim_end_matches('/'),
            self.secondary_api_path.trim_start_matches('/')
        );
        Url::parse(&url).map_err(|e| DiscoveryError::InvalidResourceId {
            value: resource.to_string(),
            reason: e.to_string(),
        })?;
        Ok(url)
    }
}

/// Check that every consent hint has the `<resource>/<suffix>` shape.
pub fn validate_consolidation(
    consent_hint_scopes: &[String],
    suffix: &str,
) -> Result<(), ConfigurationError> {
    let tail = format!("/{}", suffix.to_ascii_lowercase());
    for scope in consent_hint_scopes {
        let lower = scope.to_ascii_lowercase();
        match lower.strip_suffix(&tail) {
            Some(resource) if !resource.trim_end_matches('/').is_empty() => {}
            _ => {
                return Err(ConfigurationError::InconsistentConsolidation {
                    scope: scope.clone(),
                    suffix: suffix.to_string(),
                })
            }
        }
    }
    Ok(())
}
