//! Discovered Resource Identifier

use serde_json::Value;
use std::fmt;

use crate::error::DiscoveryError;
use crate::types::{FlowConfig, ScopeSet};

/// Identifier of the secondary resource, learned from the primary API.
///
/// Non-blank, without trailing `/`. Lives for one flow run only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredResourceId(String);

impl DiscoveredResourceId {
    /// Validate a raw identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, DiscoveryError> {
        let raw = value.into();
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(DiscoveryError::InvalidResourceId {
                value: raw,
                reason: "identifier is blank".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Extract the identifier from a JSON response `body`, reading `field`.
    ///
    /// A missing or `null` field, a non-string value and a malformed body are
    /// all errors; there is no fallback value.
    pub fn from_response(body: &str, field: &str) -> Result<Self, DiscoveryError> {
        let json: Value = serde_json::from_str(body).map_err(|e| DiscoveryError::InvalidJson {
            message: e.to_string(),
        })?;

        match json.get(field) {
            None | Some(Value::Null) => Err(DiscoveryError::MissingField {
                field: field.to_string(),
            }),
            Some(Value::String(value)) => Self::new(value.as_str()),
            Some(_) => Err(DiscoveryError::InvalidField {
                field: field.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Secondary scope set: `{ <id>/<suffix> }`.
    pub fn scopes(&self, config: &FlowConfig) -> Result<ScopeSet, DiscoveryError> {
        let scope = config.resource_scope(&self.0);
        ScopeSet::single(scope.as_str()).map_err(|e| DiscoveryError::InvalidResourceId {
            value: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for DiscoveredResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::flow_config;

    #[test]
    fn test_extracts_field() {
        let id = DiscoveredResourceId::from_response(
            r#"{"webUrl":"https://x.sharepoint.com","id":"root"}"#,
            "webUrl",
        )
        .unwrap();
        assert_eq!(id.as_str(), "https://x.sharepoint.com");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let id = DiscoveredResourceId::new("https://x.sharepoint.com/").unwrap();
        assert_eq!(id.to_string(), "https://x.sharepoint.com");
    }

    #[test]
    fn test_missing_and_null_field() {
        assert!(matches!(
            DiscoveredResourceId::from_response(r#"{"id":"root"}"#, "webUrl"),
            Err(DiscoveryError::MissingField { .. })
        ));
        assert!(matches!(
            DiscoveredResourceId::from_response(r#"{"webUrl":null}"#, "webUrl"),
            Err(DiscoveryError::MissingField { .. })
        ));
    }

    #[test]
    fn test_non_string_and_blank_field() {
        assert!(matches!(
            DiscoveredResourceId::from_response(r#"{"webUrl":42}"#, "webUrl"),
            Err(DiscoveryError::InvalidField { .. })
        ));
        assert!(matches!(
            DiscoveredResourceId::from_response(r#"{"webUrl":"  "}"#, "webUrl"),
            Err(DiscoveryError::InvalidResourceId { .. })
        ));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            DiscoveredResourceId::from_response("<html>", "webUrl"),
            Err(DiscoveryError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_secondary_scope() {
        let config = flow_config()
            .consent_hint_scopes(Vec::<String>::new())
            .resource_scope_suffix("manage-scope-suffix")
            .build()
            .unwrap();
        let id = DiscoveredResourceId::new("https://x.sharepoint.com").unwrap();
        let scopes = id.scopes(&config).unwrap();
        assert_eq!(
            scopes.as_slice(),
            ["https://x.sharepoint.com/manage-scope-suffix"]
        );
    }
}
