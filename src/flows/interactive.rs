//! Interactive Acquisition
//!
//! Browser-based sign-in with consent for the target scopes plus any extra
//! scopes consolidated into the same prompt.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::AuthError;
use crate::token::TokenCache;
use crate::types::{
    AccessToken, Account, AuthorityConfig, ExtraConsentSet, InteractiveGrant, InteractiveRequest,
    ScopeSet,
};

/// Interactive authentication interface.
#[async_trait]
pub trait InteractiveAuthenticator: Send + Sync {
    /// Sign the user in and return a token for `scopes`.
    ///
    /// Consent is recorded for `extra` as well, but the token only carries
    /// `scopes`. `account_hint` pre-selects an account when known.
    async fn acquire_interactive(
        &self,
        scopes: &ScopeSet,
        extra: &ExtraConsentSet,
        account_hint: Option<&Account>,
    ) -> Result<AccessToken, AuthError>;
}

/// The browser/redirect handshake, supplied by the embedding application.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Run the handshake for `request` and return what the provider granted.
    async fn authorize(&self, request: &InteractiveRequest) -> Result<InteractiveGrant, AuthError>;
}

/// Interactive authenticator that records every grant in a [`TokenCache`].
///
/// The cached account and refresh material are what later silent
/// acquisitions run on. Accounts without an environment are stamped with
/// the authority host.
pub struct CachingInteractiveAuthenticator<P: AuthorizationPrompt, C: TokenCache> {
    authority: AuthorityConfig,
    prompt: Arc<P>,
    cache: Arc<C>,
}

impl<P: AuthorizationPrompt, C: TokenCache> CachingInteractiveAuthenticator<P, C> {
    /// Create new interactive authenticator.
    pub fn new(authority: AuthorityConfig, prompt: Arc<P>, cache: Arc<C>) -> Self {
        Self {
            authority,
            prompt,
            cache,
        }
    }
}

#[async_trait]
impl<P: AuthorizationPrompt, C: TokenCache> InteractiveAuthenticator
    for CachingInteractiveAuthenticator<P, C>
{
    async fn acquire_interactive(
        &self,
        scopes: &ScopeSet,
        extra: &ExtraConsentSet,
        account_hint: Option<&Account>,
    ) -> Result<AccessToken, AuthError> {
        let request =
            InteractiveRequest::new(self.authority.clone(), scopes.clone(), extra.clone())
                .with_account_hint(account_hint.cloned());

        let grant = self.prompt.authorize(&request).await?;
        tracing::info!(
            account = %grant.account.home_account_id,
            consented = request.consented_scopes().len(),
            "Interactive sign-in completed"
        );

        let account = match (&grant.account.environment, self.authority.environment()) {
            (None, Some(host)) => grant.account.clone().with_environment(host),
            _ => grant.account.clone(),
        };

        self.cache.save_account(&account).await?;
        self.cache.store_token(&account, &grant.token).await?;
        if let Some(refresh_token) = grant.refresh_token {
            self.cache
                .store_refresh_token(&account, refresh_token)
                .await?;
        }

        Ok(grant.token)
    }
}

/// Recorded [`InteractiveAuthenticator`] call.
#[derive(Clone, Debug)]
pub struct InteractiveCall {
    pub scopes: ScopeSet,
    pub extra: ExtraConsentSet,
    pub account_hint: Option<Account>,
}

/// Mock interactive authenticator for testing.
#[derive(Default)]
pub struct MockInteractiveAuthenticator {
    outcomes: Mutex<VecDeque<Result<AccessToken, AuthError>>>,
    history: Mutex<Vec<InteractiveCall>>,
}

impl MockInteractiveAuthenticator {
    /// Create new mock interactive authenticator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful acquisition.
    pub fn queue_token(&self, token: AccessToken) -> &Self {
        self.outcomes.lock().unwrap().push_back(Ok(token));
        self
    }

    /// Queue a failure.
    pub fn queue_error(&self, error: AuthError) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Get call history.
    pub fn get_calls(&self) -> Vec<InteractiveCall> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractiveAuthenticator for MockInteractiveAuthenticator {
    async fn acquire_interactive(
        &self,
        scopes: &ScopeSet,
        extra: &ExtraConsentSet,
        account_hint: Option<&Account>,
    ) -> Result<AccessToken, AuthError> {
        self.history.lock().unwrap().push(InteractiveCall {
            scopes: scopes.clone(),
            extra: extra.clone(),
            account_hint: account_hint.cloned(),
        });

        self.outcomes.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(AccessToken::bearer(
                "mock-interactive-token",
                scopes.clone(),
            ))
        })
    }
}

/// Mock authorization prompt for testing.
///
/// Grants every request as `account` unless an error is set, issuing a
/// token for the request's target scopes and a refresh token.
pub struct MockAuthorizationPrompt {
    account: Account,
    history: Mutex<Vec<InteractiveRequest>>,
    next_error: Mutex<Option<AuthError>>,
}

impl MockAuthorizationPrompt {
    /// Create new mock prompt signing in as `account`.
    pub fn new(account: Account) -> Self {
        Self {
            account,
            history: Mutex::new(Vec::new()),
            next_error: Mutex::new(None),
        }
    }

    /// Fail the next handshake.
    pub fn set_next_error(&self, error: AuthError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Requests seen so far.
    pub fn get_requests(&self) -> Vec<InteractiveRequest> {
        self.history.lock().unwrap().clone()
    }

    /// Number of handshakes run.
    pub fn prompt_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthorizationPrompt for MockAuthorizationPrompt {
    async fn authorize(&self, request: &InteractiveRequest) -> Result<InteractiveGrant, AuthError> {
        self.history.lock().unwrap().push(request.clone());

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        Ok(InteractiveGrant {
            account: self.account.clone(),
            token: AccessToken::bearer("mock-interactive-token", request.scopes.clone()),
            refresh_token: Some(SecretString::new("mock-refresh-token".to_string())),
        })
    }
}
