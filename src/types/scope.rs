//! Scope Types
//!
//! Scope sets requested for tokens and for consolidated consent.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigurationError;

/// Scopes the provider adds to every authorization request.
pub const RESERVED_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

fn normalize<I, S>(scopes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    scopes
        .into_iter()
        .map(|s| s.into().trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_ascii_lowercase()))
        .collect()
}

/// Non-empty, ordered set of resource scopes.
///
/// Order is kept for display and wire encoding; equality ignores it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet {
    scopes: Vec<String>,
}

impl ScopeSet {
    /// Create a scope set, rejecting an empty (or all-blank) input.
    pub fn new<I, S>(scopes: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes = normalize(scopes);
        if scopes.is_empty() {
            return Err(ConfigurationError::InvalidScope {
                message: "scope set must contain at least one scope".to_string(),
            });
        }
        Ok(Self { scopes })
    }

    /// Create a scope set holding one scope.
    pub fn single(scope: impl Into<String>) -> Result<Self, ConfigurationError> {
        Self::new([scope.into()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.scopes
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Never true for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s.eq_ignore_ascii_case(scope))
    }

    /// True when every scope of `other` is in `self`.
    pub fn covers(&self, other: &ScopeSet) -> bool {
        other.iter().all(|s| self.contains(s))
    }

    /// Order-independent key used by token caches.
    pub fn cache_key(&self) -> String {
        let mut keys: Vec<String> = self.scopes.iter().map(|s| s.to_ascii_lowercase()).collect();
        keys.sort();
        keys.join(" ")
    }

    /// Space-delimited form used in the OAuth2 `scope` parameter.
    pub fn to_scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

impl PartialEq for ScopeSet {
    fn eq(&self, other: &Self) -> bool {
        self.cache_key() == other.cache_key()
    }
}

impl Eq for ScopeSet {}

impl std::hash::Hash for ScopeSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.cache_key().hash(state);
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_scope_param())
    }
}

impl TryFrom<Vec<String>> for ScopeSet {
    type Error = ConfigurationError;

    fn try_from(scopes: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(scopes)
    }
}

impl From<ScopeSet> for Vec<String> {
    fn from(set: ScopeSet) -> Self {
        set.scopes
    }
}

/// Scopes to consent to alongside a token request, without being minted.
///
/// Unlike [`ScopeSet`] this may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExtraConsentSet {
    scopes: Vec<String>,
}

impl ExtraConsentSet {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scopes: normalize(scopes),
        }
    }

    /// No extra consent.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.scopes
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl From<ScopeSet> for ExtraConsentSet {
    fn from(set: ScopeSet) -> Self {
        Self { scopes: set.scopes }
    }
}

impl From<&ScopeSet> for ExtraConsentSet {
    fn from(set: &ScopeSet) -> Self {
        Self {
            scopes: set.scopes.clone(),
        }
    }
}

impl From<Vec<String>> for ExtraConsentSet {
    fn from(scopes: Vec<String>) -> Self {
        Self::new(scopes)
    }
}

impl From<ExtraConsentSet> for Vec<String> {
    fn from(set: ExtraConsentSet) -> Self {
        set.scopes
    }
}

impl fmt::Display for ExtraConsentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scopes.join(" "))
    }
}
