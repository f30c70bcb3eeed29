//! Silent Acquisition
//!
//! Satisfies a scope request from cached material only. Never prompts.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{InteractionReason, SilentAuthError};
use crate::token::{RefreshTokenRedeemer, TokenCache};
use crate::types::{AccessToken, Account, ScopeSet};

/// Silent authentication interface.
#[async_trait]
pub trait SilentAuthenticator: Send + Sync {
    /// Acquire a token for `scopes` on behalf of `account` without user
    /// interaction.
    ///
    /// Fails with [`SilentAuthError::InteractionRequired`] when cached
    /// material is absent or does not carry consent for `scopes`.
    async fn acquire_silent(
        &self,
        scopes: &ScopeSet,
        account: &Account,
    ) -> Result<AccessToken, SilentAuthError>;
}

/// Silent authenticator over a [`TokenCache`] and a [`RefreshTokenRedeemer`].
///
/// Serves a cached covering token when one is fresh, otherwise redeems the
/// account's refresh token for the requested scopes.
pub struct CachedSilentAuthenticator<C: TokenCache, R: RefreshTokenRedeemer> {
    cache: Arc<C>,
    redeemer: Arc<R>,
    expiry_buffer: Duration,
}

impl<C: TokenCache, R: RefreshTokenRedeemer> CachedSilentAuthenticator<C, R> {
    /// Create new silent authenticator.
    pub fn new(cache: Arc<C>, redeemer: Arc<R>, expiry_buffer: Duration) -> Self {
        Self {
            cache,
            redeemer,
            expiry_buffer,
        }
    }
}

#[async_trait]
impl<C: TokenCache, R: RefreshTokenRedeemer> SilentAuthenticator
    for CachedSilentAuthenticator<C, R>
{
    async fn acquire_silent(
        &self,
        scopes: &ScopeSet,
        account: &Account,
    ) -> Result<AccessToken, SilentAuthError> {
        if let Some(token) = self
            .cache
            .find_token(account, scopes, self.expiry_buffer)
            .await?
        {
            tracing::debug!(%scopes, "Serving cached access token");
            return Ok(token);
        }

        let refresh_token = self.cache.refresh_token(account).await?.ok_or(
            SilentAuthError::InteractionRequired {
                reason: InteractionReason::NoCachedMaterial,
            },
        )?;

        tracing::debug!(%scopes, "Redeeming refresh token");
        let response = self.redeemer.redeem(&refresh_token, scopes).await?;

        let token = AccessToken::from_response(&response, scopes);
        self.cache.store_token(account, &token).await?;
        if let Some(rotated) = response.refresh_token {
            self.cache
                .store_refresh_token(account, SecretString::new(rotated))
                .await?;
        }

        Ok(token)
    }
}

/// Recorded [`SilentAuthenticator`] call.
#[derive(Clone, Debug)]
pub struct SilentCall {
    pub scopes: ScopeSet,
    pub account: Account,
}

/// Mock silent authenticator for testing.
///
/// Returns queued outcomes in order, then a fresh mock token.
#[derive(Default)]
pub struct MockSilentAuthenticator {
    outcomes: Mutex<VecDeque<Result<AccessToken, SilentAuthError>>>,
    history: Mutex<Vec<SilentCall>>,
}

impl MockSilentAuthenticator {
    /// Create new mock silent authenticator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful acquisition.
    pub fn queue_token(&self, token: AccessToken) -> &Self {
        self.outcomes.lock().unwrap().push_back(Ok(token));
        self
    }

    /// Queue a failure.
    pub fn queue_error(&self, error: SilentAuthError) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Get call history.
    pub fn get_calls(&self) -> Vec<SilentCall> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl SilentAuthenticator for MockSilentAuthenticator {
    async fn acquire_silent(
        &self,
        scopes: &ScopeSet,
        account: &Account,
    ) -> Result<AccessToken, SilentAuthError> {
        self.history.lock().unwrap().push(SilentCall {
            scopes: scopes.clone(),
            account: account.clone(),
        });

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(AccessToken::bearer("mock-silent-token", scopes.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::token::{MockRefreshTokenRedeemer, MockTokenCache};
    use chrono::Utc;
    use secrecy::ExposeSecret;

    fn scopes(scope: &str) -> ScopeSet {
        ScopeSet::single(scope).unwrap()
    }

    fn authenticator(
        cache: Arc<MockTokenCache>,
        redeemer: Arc<MockRefreshTokenRedeemer>,
    ) -> CachedSilentAuthenticator<MockTokenCache, MockRefreshTokenRedeemer> {
        CachedSilentAuthenticator::new(cache, redeemer, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_serves_cached_token() {
        let cache = Arc::new(MockTokenCache::new());
        let redeemer = Arc::new(MockRefreshTokenRedeemer::new());
        let account = Account::new("acct1");
        let cached = AccessToken::new(
            "cached",
            "Bearer",
            Some(Utc::now() + chrono::Duration::hours(1)),
            scopes("A/read"),
        );
        cache.store_token(&account, &cached).await.unwrap();

        let token = authenticator(cache, redeemer.clone())
            .acquire_silent(&scopes("A/read"), &account)
            .await
            .unwrap();

        assert_eq!(token.secret(), "cached");
        assert!(redeemer.get_history().is_empty());
    }

    #[tokio::test]
    async fn test_no_material_requires_interaction() {
        let cache = Arc::new(MockTokenCache::new());
        let redeemer = Arc::new(MockRefreshTokenRedeemer::new());

        let error = authenticator(cache, redeemer)
            .acquire_silent(&scopes("A/read"), &Account::new("acct1"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            SilentAuthError::InteractionRequired {
                reason: InteractionReason::NoCachedMaterial
            }
        ));
    }

    #[tokio::test]
    async fn test_redeems_and_rotates_refresh_token() {
        let cache = Arc::new(MockTokenCache::new());
        let redeemer = Arc::new(MockRefreshTokenRedeemer::new());
        let account = Account::new("acct1");
        cache
            .store_refresh_token(&account, SecretString::new("rt-0".to_string()))
            .await
            .unwrap();

        let silent = authenticator(cache.clone(), redeemer.clone());
        let token = silent
            .acquire_silent(&scopes("B/manage"), &account)
            .await
            .unwrap();

        assert_eq!(token.scopes, scopes("B/manage"));
        assert_eq!(redeemer.get_history(), vec![scopes("B/manage")]);
        let rotated = cache.refresh_token(&account).await.unwrap().unwrap();
        assert_eq!(rotated.expose_secret(), "rotated-refresh-token");

        // second call is served from the cache
        silent
            .acquire_silent(&scopes("B/manage"), &account)
            .await
            .unwrap();
        assert_eq!(redeemer.get_history().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_failure_is_fatal() {
        let cache = Arc::new(MockTokenCache::new());
        cache.set_should_fail(true);
        let redeemer = Arc::new(MockRefreshTokenRedeemer::new());

        let error = authenticator(cache, redeemer)
            .acquire_silent(&scopes("A/read"), &Account::new("acct1"))
            .await
            .unwrap_err();

        assert!(matches!(error, SilentAuthError::Failed(AuthError::Cache(_))));
    }

    #[tokio::test]
    async fn test_mock_returns_queued_outcomes() {
        let silent = MockSilentAuthenticator::new();
        silent.queue_error(SilentAuthError::interaction_required(
            InteractionReason::ConsentRequired,
        ));

        let account = Account::new("acct1");
        assert!(silent
            .acquire_silent(&scopes("A/read"), &account)
            .await
            .unwrap_err()
            .is_interaction_required());
        assert_eq!(
            silent
                .acquire_silent(&scopes("A/read"), &account)
                .await
                .unwrap()
                .secret(),
            "mock-silent-token"
        );
        assert_eq!(silent.get_calls().len(), 2);
    }
}
