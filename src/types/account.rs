//! Account Types

use serde::{Deserialize, Serialize};

/// Identity-provider account with previously granted consent.
///
/// Identity is `home_account_id`; the other fields are descriptive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    /// Provider-scoped unique account identifier.
    pub home_account_id: String,
    /// Sign-in name, used as `login_hint` when re-prompting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Authority host the account belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl Account {
    pub fn new(home_account_id: impl Into<String>) -> Self {
        Self {
            home_account_id: home_account_id.into(),
            username: None,
            environment: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Value for the authorization request's `login_hint`.
    pub fn login_hint(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.home_account_id == other.home_account_id
    }
}

impl Eq for Account {}

impl std::hash::Hash for Account {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.home_account_id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_identity() {
        let a = Account::new("uid.tid").with_username("alice@contoso.com");
        let b = Account::new("uid.tid");
        assert_eq!(a, b);
        assert_eq!(a.login_hint(), Some("alice@contoso.com"));
        assert_eq!(b.login_hint(), None);
    }
}
