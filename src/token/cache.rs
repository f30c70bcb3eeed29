//! Token Cache
//!
//! Accounts, access tokens keyed by (account, scope set), and refresh material.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::types::{AccessToken, Account, ScopeSet};

/// Token cache interface.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Accounts with cached material, oldest first.
    async fn list_accounts(&self) -> Result<Vec<Account>, CacheError>;

    /// Add or update an account.
    async fn save_account(&self, account: &Account) -> Result<(), CacheError>;

    /// Remove an account and everything cached for it.
    async fn remove_account(&self, account: &Account) -> Result<bool, CacheError>;

    /// Find a token covering `scopes` that does not expire within `buffer`.
    async fn find_token(
        &self,
        account: &Account,
        scopes: &ScopeSet,
        buffer: Duration,
    ) -> Result<Option<AccessToken>, CacheError>;

    /// Store a token under (account, token scopes).
    async fn store_token(&self, account: &Account, token: &AccessToken) -> Result<(), CacheError>;

    /// Refresh token for an account.
    async fn refresh_token(&self, account: &Account) -> Result<Option<SecretString>, CacheError>;

    /// Replace the refresh token for an account.
    async fn store_refresh_token(
        &self,
        account: &Account,
        refresh_token: SecretString,
    ) -> Result<(), CacheError>;
}

type TokenKey = (String, String);

/// In-memory token cache implementation.
#[derive(Default)]
pub struct InMemoryTokenCache {
    accounts: RwLock<Vec<Account>>,
    tokens: RwLock<HashMap<TokenKey, AccessToken>>,
    refresh_tokens: RwLock<HashMap<String, SecretString>>,
}

impl InMemoryTokenCache {
    /// Create new in-memory token cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(account: &Account, scopes: &ScopeSet) -> TokenKey {
        (account.home_account_id.clone(), scopes.cache_key())
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn list_accounts(&self) -> Result<Vec<Account>, CacheError> {
        Ok(self.accounts.read().await.clone())
    }

    async fn save_account(&self, account: &Account) -> Result<(), CacheError> {
        let mut accounts = self.accounts.write().await;
        match accounts
            .iter_mut()
            .find(|a| a.home_account_id == account.home_account_id)
        {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        Ok(())
    }

    async fn remove_account(&self, account: &Account) -> Result<bool, CacheError> {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|a| a != account);

        self.tokens
            .write()
            .await
            .retain(|(id, _), _| *id != account.home_account_id);
        self.refresh_tokens
            .write()
            .await
            .remove(&account.home_account_id);

        Ok(accounts.len() != before)
    }

    async fn find_token(
        &self,
        account: &Account,
        scopes: &ScopeSet,
        buffer: Duration,
    ) -> Result<Option<AccessToken>, CacheError> {
        let tokens = self.tokens.read().await;

        if let Some(token) = tokens.get(&Self::key(account, scopes)) {
            if !token.is_expiring_within(buffer) {
                return Ok(Some(token.clone()));
            }
        }

        Ok(tokens
            .iter()
            .filter(|((id, _), _)| *id == account.home_account_id)
            .map(|(_, token)| token)
            .find(|token| token.scopes.covers(scopes) && !token.is_expiring_within(buffer))
            .cloned())
    }

    async fn store_token(&self, account: &Account, token: &AccessToken) -> Result<(), CacheError> {
        self.tokens
            .write()
            .await
            .insert(Self::key(account, &token.scopes), token.clone());
        Ok(())
    }

    async fn refresh_token(&self, account: &Account) -> Result<Option<SecretString>, CacheError> {
        Ok(self
            .refresh_tokens
            .read()
            .await
            .get(&account.home_account_id)
            .cloned())
    }

    async fn store_refresh_token(
        &self,
        account: &Account,
        refresh_token: SecretString,
    ) -> Result<(), CacheError> {
        self.refresh_tokens
            .write()
            .await
            .insert(account.home_account_id.clone(), refresh_token);
        Ok(())
    }
}

/// Mock token cache for testing.
///
/// Backed by [`InMemoryTokenCache`], with call counting and failure injection.
#[derive(Default)]
pub struct MockTokenCache {
    inner: InMemoryTokenCache,
    list_accounts_calls: Mutex<u32>,
    should_fail: Mutex<bool>,
}

impl MockTokenCache {
    /// Create new mock token cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an account.
    pub async fn add_account(&self, account: Account) -> &Self {
        let _ = self.inner.save_account(&account).await;
        self
    }

    /// Set cache to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Number of `list_accounts` calls.
    pub fn list_accounts_calls(&self) -> u32 {
        *self.list_accounts_calls.lock().unwrap()
    }

    fn check_error(&self) -> Result<(), CacheError> {
        if *self.should_fail.lock().unwrap() {
            return Err(CacheError::ReadFailed {
                message: "Mock cache failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TokenCache for MockTokenCache {
    async fn list_accounts(&self) -> Result<Vec<Account>, CacheError> {
        *self.list_accounts_calls.lock().unwrap() += 1;
        self.check_error()?;
        self.inner.list_accounts().await
    }

    async fn save_account(&self, account: &Account) -> Result<(), CacheError> {
        self.check_error()?;
        self.inner.save_account(account).await
    }

    async fn remove_account(&self, account: &Account) -> Result<bool, CacheError> {
        self.check_error()?;
        self.inner.remove_account(account).await
    }

    async fn find_token(
        &self,
        account: &Account,
        scopes: &ScopeSet,
        buffer: Duration,
    ) -> Result<Option<AccessToken>, CacheError> {
        self.check_error()?;
        self.inner.find_token(account, scopes, buffer).await
    }

    async fn store_token(&self, account: &Account, token: &AccessToken) -> Result<(), CacheError> {
        self.check_error()?;
        self.inner.store_token(account, token).await
    }

    async fn refresh_token(&self, account: &Account) -> Result<Option<SecretString>, CacheError> {
        self.check_error()?;
        self.inner.refresh_token(account).await
    }

    async fn store_refresh_token(
        &self,
        account: &Account,
        refresh_token: SecretString,
    ) -> Result<(), CacheError> {
        self.check_error()?;
        self.inner.store_refresh_token(account, refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use secrecy::ExposeSecret;

    fn scopes(list: &[&str]) -> ScopeSet {
        ScopeSet::new(list.iter().copied()).unwrap()
    }

    fn token(value: &str, list: &[&str], ttl_secs: i64) -> AccessToken {
        AccessToken::new(
            value,
            "Bearer",
            Some(Utc::now() + chrono::Duration::seconds(ttl_secs)),
            scopes(list),
        )
    }

    #[tokio::test]
    async fn test_accounts_keep_insertion_order() {
        let cache = InMemoryTokenCache::new();
        cache.save_account(&Account::new("a")).await.unwrap();
        cache.save_account(&Account::new("b")).await.unwrap();
        cache
            .save_account(&Account::new("a").with_username("alice"))
            .await
            .unwrap();

        let accounts = cache.list_accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].username.as_deref(), Some("alice"));
        assert_eq!(accounts[1].home_account_id, "b");
    }

    #[tokio::test]
    async fn test_find_token_by_set_membership() {
        let cache = InMemoryTokenCache::new();
        let account = Account::new("a");
        cache
            .store_token(&account, &token("t1", &["A/read", "A/write"], 3600))
            .await
            .unwrap();

        let exact = cache
            .find_token(&account, &scopes(&["A/write", "A/read"]), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(exact.unwrap().secret(), "t1");

        let subset = cache
            .find_token(&account, &scopes(&["A/read"]), Duration::ZERO)
            .await
            .unwrap();
        assert!(subset.is_some());

        let other = cache
            .find_token(&account, &scopes(&["B/manage"]), Duration::ZERO)
            .await
            .unwrap();
        assert!(other.is_none());

        let other_account = cache
            .find_token(&Account::new("b"), &scopes(&["A/read"]), Duration::ZERO)
            .await
            .unwrap();
        assert!(other_account.is_none());
    }

    #[tokio::test]
    async fn test_find_token_skips_expiring() {
        let cache = InMemoryTokenCache::new();
        let account = Account::new("a");
        cache
            .store_token(&account, &token("t1", &["A/read"], 60))
            .await
            .unwrap();

        let found = cache
            .find_token(&account, &scopes(&["A/read"]), Duration::from_secs(300))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_remove_account_drops_material() {
        let cache = InMemoryTokenCache::new();
        let account = Account::new("a");
        cache.save_account(&account).await.unwrap();
        cache
            .store_token(&account, &token("t1", &["A/read"], 3600))
            .await
            .unwrap();
        cache
            .store_refresh_token(&account, SecretString::new("rt".to_string()))
            .await
            .unwrap();

        assert!(cache.remove_account(&account).await.unwrap());
        assert!(cache.list_accounts().await.unwrap().is_empty());
        assert!(cache.refresh_token(&account).await.unwrap().is_none());
        assert!(cache
            .find_token(&account, &scopes(&["A/read"]), Duration::ZERO)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_refresh_token_roundtrip() {
        let cache = InMemoryTokenCache::new();
        let account = Account::new("a");
        cache
            .store_refresh_token(&account, SecretString::new("rt-1".to_string()))
            .await
            .unwrap();
        let stored = cache.refresh_token(&account).await.unwrap().unwrap();
        assert_eq!(stored.expose_secret(), "rt-1");
    }

    #[tokio::test]
    async fn test_mock_cache_failure_and_counts() {
        let cache = MockTokenCache::new();
        cache.add_account(Account::new("a")).await;

        assert_eq!(cache.list_accounts().await.unwrap().len(), 1);
        cache.set_should_fail(true);
        assert!(cache.list_accounts().await.is_err());
        assert_eq!(cache.list_accounts_calls(), 2);
    }
}
