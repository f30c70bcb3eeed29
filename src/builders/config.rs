//! Configuration Builders
//!
//! Fluent builders for authority and discovery flow configuration.

use std::time::Duration;
use url::Url;

use crate::error::ConfigurationError;
use crate::types::{
    validate_consolidation, AuthorityConfig, FlowConfig, ScopeSet, DEFAULT_AUTHORITY,
    DEFAULT_CONSENT_HINT_SCOPES, DEFAULT_DISCOVERY_FIELD, DEFAULT_DISCOVERY_URL,
    DEFAULT_EXPIRY_BUFFER_SECS, DEFAULT_PRIMARY_SCOPES, DEFAULT_REDIRECT_URI,
    DEFAULT_RESOURCE_SCOPE_SUFFIX, DEFAULT_SECONDARY_API_PATH, DEFAULT_TIMEOUT_SECS,
};

fn parse_url(value: &str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(value).map_err(|_| ConfigurationError::InvalidEndpoint {
        url: value.to_string(),
    })?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigurationError::InvalidEndpoint {
            url: value.to_string(),
        });
    }
    Ok(url)
}

/// Authority configuration builder.
#[derive(Default)]
pub struct AuthorityConfigBuilder {
    client_id: Option<String>,
    authority: Option<String>,
    redirect_uri: Option<String>,
    timeout: Option<Duration>,
    expiry_buffer: Option<Duration>,
}

impl AuthorityConfigBuilder {
    /// Create new authority configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set authority URL.
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Set redirect URI.
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Set token endpoint timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the window before expiry in which cached tokens are not reused.
    pub fn expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = Some(buffer);
        self
    }

    /// Fill unset fields from `CONSENT_CLIENT_ID`, `CONSENT_AUTHORITY`
    /// and `CONSENT_REDIRECT_URI`.
    pub fn from_env(mut self) -> Self {
        if self.client_id.is_none() {
            self.client_id = std::env::var("CONSENT_CLIENT_ID").ok();
        }
        if self.authority.is_none() {
            self.authority = std::env::var("CONSENT_AUTHORITY").ok();
        }
        if self.redirect_uri.is_none() {
            self.redirect_uri = std::env::var("CONSENT_REDIRECT_URI").ok();
        }
        self
    }

    /// Build the authority configuration.
    pub fn build(self) -> Result<AuthorityConfig, ConfigurationError> {
        let client_id = self
            .client_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "client_id".to_string(),
            })?;

        let authority = parse_url(self.authority.as_deref().unwrap_or(DEFAULT_AUTHORITY))?;
        let redirect_uri = parse_url(self.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI))?;

        Ok(AuthorityConfig {
            client_id,
            authority,
            redirect_uri,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            expiry_buffer: self
                .expiry_buffer
                .unwrap_or(Duration::from_secs(DEFAULT_EXPIRY_BUFFER_SECS)),
        })
    }
}

/// Discovery flow configuration builder.
pub struct FlowConfigBuilder {
    primary_scopes: Vec<String>,
    consent_hint_scopes: Vec<String>,
    discovery_url: String,
    discovery_field: String,
    resource_scope_suffix: String,
    secondary_api_path: String,
}

impl Default for FlowConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowConfigBuilder {
    /// Create a builder preloaded with the primary/secondary defaults.
    pub fn new() -> Self {
        Self {
            primary_scopes: DEFAULT_PRIMARY_SCOPES.iter().map(|s| s.to_string()).collect(),
            consent_hint_scopes: DEFAULT_CONSENT_HINT_SCOPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            discovery_field: DEFAULT_DISCOVERY_FIELD.to_string(),
            resource_scope_suffix: DEFAULT_RESOURCE_SCOPE_SUFFIX.to_string(),
            secondary_api_path: DEFAULT_SECONDARY_API_PATH.to_string(),
        }
    }

    /// Replace the primary scopes.
    pub fn primary_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the consent hint scopes (pass an empty list to disable consolidation).
    pub fn consent_hint_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consent_hint_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the discovery endpoint.
    pub fn discovery_url(mut self, url: impl Into<String>) -> Self {
        self.discovery_url = url.into();
        self
    }

    /// Set the JSON field holding the resource identifier.
    pub fn discovery_field(mut self, field: impl Into<String>) -> Self {
        self.discovery_field = field.into();
        self
    }

    /// Set the secondary scope suffix.
    pub fn resource_scope_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.resource_scope_suffix = suffix.into();
        self
    }

    /// Set the secondary API path.
    pub fn secondary_api_path(mut self, path: impl Into<String>) -> Self {
        self.secondary_api_path = path.into();
        self
    }

    /// Override the discovery URL from `CONSENT_DISCOVERY_URL` when set.
    pub fn from_env(mut self) -> Self {
        if let Ok(url) = std::env::var("CONSENT_DISCOVERY_URL") {
            self.discovery_url = url;
        }
        self
    }

    /// Build the flow configuration.
    pub fn build(self) -> Result<FlowConfig, ConfigurationError> {
        let primary_scopes = ScopeSet::new(self.primary_scopes)?;

        let discovery_url = parse_url(&self.discovery_url)?;

        if self.discovery_field.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "discovery_field".to_string(),
            });
        }

        let resource_scope_suffix = self.resource_scope_suffix.trim_matches('/').to_string();
        if resource_scope_suffix.is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "resource_scope_suffix".to_string(),
            });
        }

        let consent_hint_scopes: Vec<String> = self
            .consent_hint_scopes
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        validate_consolidation(&consent_hint_scopes, &resource_scope_suffix)?;

        Ok(FlowConfig {
            primary_scopes,
            consent_hint_scopes,
            discovery_url,
            discovery_field: self.discovery_field,
            resource_scope_suffix,
            secondary_api_path: self.secondary_api_path,
        })
    }
}

/// Create a new authority configuration builder.
pub fn authority_config() -> AuthorityConfigBuilder {
    AuthorityConfigBuilder::new()
}

/// Create a new flow configuration builder.
pub fn flow_config() -> FlowConfigBuilder {
    FlowConfigBuilder::new()
}
