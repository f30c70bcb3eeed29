//! Authorization Types
//!
//! Types exchanged with the interactive authorization handshake.

use secrecy::SecretString;
use url::Url;

use super::account::Account;
use super::config::AuthorityConfig;
use super::scope::{ExtraConsentSet, ScopeSet, RESERVED_SCOPES};
use super::token::AccessToken;

/// `prompt` sent with every authorization request.
pub const SELECT_ACCOUNT_PROMPT: &str = "select_account";

/// One interactive authorization request.
///
/// `scopes` are minted into the token; `extra_consent` is only consented.
/// The user is always offered the account picker.
#[derive(Clone, Debug)]
pub struct InteractiveRequest {
    /// Authority the handshake runs against.
    pub authority: AuthorityConfig,
    pub scopes: ScopeSet,
    pub extra_consent: ExtraConsentSet,
    /// Account to re-authenticate, if one is known.
    pub account_hint: Option<Account>,
}

impl InteractiveRequest {
    pub fn new(
        authority: AuthorityConfig,
        scopes: ScopeSet,
        extra_consent: ExtraConsentSet,
    ) -> Self {
        Self {
            authority,
            scopes,
            extra_consent,
            account_hint: None,
        }
    }

    pub fn with_account_hint(mut self, account: Option<Account>) -> Self {
        self.account_hint = account;
        self
    }

    /// Every scope the user is asked to consent to, each once.
    ///
    /// Target scopes first, then extra consent, then the reserved OIDC scopes.
    pub fn consented_scopes(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        let candidates = self
            .scopes
            .iter()
            .chain(self.extra_consent.iter())
            .chain(RESERVED_SCOPES.iter().copied());
        for scope in candidates {
            if !all.iter().any(|s| s.eq_ignore_ascii_case(scope)) {
                all.push(scope.to_string());
            }
        }
        all
    }

    /// Build the authorization endpoint URL for this request.
    pub fn authorization_url(&self, state: &str) -> Url {
        let config = &self.authority;
        let mut url = Url::parse(&config.authorization_endpoint())
            .unwrap_or_else(|_| config.authority.clone());
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &config.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", config.redirect_uri.as_str())
                .append_pair("response_mode", "query")
                .append_pair("scope", &self.consented_scopes().join(" "))
                .append_pair("state", state)
                .append_pair("prompt", SELECT_ACCOUNT_PROMPT);
            if let Some(hint) = self.account_hint.as_ref().and_then(Account::login_hint) {
                query.append_pair("login_hint", hint);
            }
        }
        url
    }
}

/// Result of a completed interactive handshake.
pub struct InteractiveGrant {
    /// Account that signed in.
    pub account: Account,
    /// Token for the request's target scopes.
    pub token: AccessToken,
    /// Refresh material covering the consented scopes.
    pub refresh_token: Option<SecretString>,
}

impl std::fmt::Debug for InteractiveGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveGrant")
            .field("account", &self.account)
            .field("token", &self.token)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
