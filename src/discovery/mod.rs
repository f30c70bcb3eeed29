//! Resource Discovery Flow
//!
//! Two-phase acquisition for a secondary resource whose identifier is only
//! known at runtime.
//!
//! Phase 1 signs in for the primary scopes while consenting to the
//! secondary hint scopes in the same prompt, then asks the primary API for
//! the secondary resource identifier. Phase 2 derives the secondary scope
//! from that identifier and acquires it, normally silently, on the consent
//! recorded in Phase 1.

pub mod resource;

pub use resource::DiscoveredResourceId;

use std::sync::Arc;
use tracing::instrument;

use crate::core::ApiClient;
use crate::error::{AuthError, FlowError, FlowPhase};
use crate::flows::{InteractiveAuthenticator, SilentAuthenticator};
use crate::orchestrator::{AcquisitionPath, TokenAcquisitionOrchestrator};
use crate::token::TokenCache;
use crate::types::{AccessToken, Account, ExtraConsentSet, FlowConfig};

/// Progress of a discovery flow run.
///
/// `Start → PrimaryTokenAcquired → ResourceDiscovered →
/// SecondaryTokenAcquired → Done`; any failure ends in `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Start,
    PrimaryTokenAcquired,
    ResourceDiscovered,
    SecondaryTokenAcquired,
    Done,
    Failed,
}

impl FlowState {
    /// Next state on success. Terminal states stay put.
    pub fn advance(self) -> Self {
        match self {
            Self::Start => Self::PrimaryTokenAcquired,
            Self::PrimaryTokenAcquired => Self::ResourceDiscovered,
            Self::ResourceDiscovered => Self::SecondaryTokenAcquired,
            Self::SecondaryTokenAcquired => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Two-phase primary/secondary acquisition.
pub struct ResourceDiscoveryFlow<S, I, C, A>
where
    S: SilentAuthenticator,
    I: InteractiveAuthenticator,
    C: TokenCache,
    A: ApiClient,
{
    orchestrator: TokenAcquisitionOrchestrator<S, I>,
    cache: Arc<C>,
    api: Arc<A>,
    config: FlowConfig,
}

impl<S, I, C, A> ResourceDiscoveryFlow<S, I, C, A>
where
    S: SilentAuthenticator,
    I: InteractiveAuthenticator,
    C: TokenCache,
    A: ApiClient,
{
    /// Create new discovery flow.
    pub fn new(
        orchestrator: TokenAcquisitionOrchestrator<S, I>,
        cache: Arc<C>,
        api: Arc<A>,
        config: FlowConfig,
    ) -> Self {
        Self {
            orchestrator,
            cache,
            api,
            config,
        }
    }

    /// Get the flow configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Run both phases and return the secondary API response body.
    #[instrument(name = "resource_discovery_flow", skip_all)]
    pub async fn run(&self) -> Result<String, FlowError> {
        let mut state = FlowState::Start;

        let result = self.run_phases(&mut state).await;
        match &result {
            Ok(_) => tracing::info!(?state, "Discovery flow completed"),
            Err(error) => {
                tracing::error!(
                    phase = %error.phase,
                    reached = ?error.reached(),
                    error_code = error.source.error_code(),
                    "Discovery flow failed"
                );
                state = FlowState::Failed;
                tracing::debug!(?state, "Discovery flow terminated");
            }
        }
        result
    }

    async fn run_phases(&self, state: &mut FlowState) -> Result<String, FlowError> {
        let primary = self.primary_token().await?;
        *state = state.advance();
        tracing::debug!(?state, "Primary token acquired");

        let resource = self.discover(&primary).await?;
        *state = state.advance();
        tracing::debug!(?state, %resource, "Secondary resource discovered");

        let secondary = self.secondary_token(&resource).await?;
        *state = state.advance();
        tracing::debug!(?state, "Secondary token acquired");

        let body = self.secondary_request(&resource, &secondary).await?;
        *state = state.advance();
        Ok(body)
    }

    /// Phase 1: acquire the primary token with the secondary hint scopes
    /// consolidated into consent, then discover the secondary resource.
    #[instrument(skip_all)]
    pub async fn acquire_primary_and_consolidated_consent(
        &self,
    ) -> Result<DiscoveredResourceId, FlowError> {
        let primary = self.primary_token().await?;
        self.discover(&primary).await
    }

    /// Phase 2: acquire a token for the discovered resource and call the
    /// secondary API with it.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn acquire_secondary(
        &self,
        resource: &DiscoveredResourceId,
    ) -> Result<String, FlowError> {
        let secondary = self.secondary_token(resource).await?;
        self.secondary_request(resource, &secondary).await
    }

    async fn current_account(&self, phase: FlowPhase) -> Result<Option<Account>, FlowError> {
        let accounts = self
            .cache
            .list_accounts()
            .await
            .map_err(|e| FlowError::new(phase, AuthError::Cache(e)))?;
        Ok(accounts.into_iter().next())
    }

    async fn primary_token(&self) -> Result<AccessToken, FlowError> {
        let phase = FlowPhase::PrimaryAcquisition;
        let account = self.current_account(phase).await?;
        let extra = ExtraConsentSet::new(self.config.consent_hint_scopes.iter().cloned());

        self.orchestrator
            .acquire(&self.config.primary_scopes, &extra, account.as_ref())
            .await
            .map_err(|e| FlowError::new(phase, e))
    }

    async fn discover(&self, primary: &AccessToken) -> Result<DiscoveredResourceId, FlowError> {
        let phase = FlowPhase::ResourceDiscovery;
        let body = self
            .api
            .get_authenticated(self.config.discovery_url.as_str(), primary)
            .await
            .map_err(|e| FlowError::new(phase, e))?;

        DiscoveredResourceId::from_response(&body, &self.config.discovery_field)
            .map_err(|e| FlowError::new(phase, e))
    }

    async fn secondary_token(
        &self,
        resource: &DiscoveredResourceId,
    ) -> Result<AccessToken, FlowError> {
        let phase = FlowPhase::SecondaryAcquisition;
        let scopes = resource
            .scopes(&self.config)
            .map_err(|e| FlowError::new(phase, e))?;

        // Phase 1 may have added the account; never reuse a stale list.
        let account = self.current_account(phase).await?;
        let extra = ExtraConsentSet::from(&self.config.primary_scopes);

        let acquired = self
            .orchestrator
            .acquire_detailed(&scopes, &extra, account.as_ref())
            .await
            .map_err(|e| FlowError::new(phase, e))?;

        if acquired.path == AcquisitionPath::Interactive {
            tracing::warn!(
                %scopes,
                "Consolidated consent did not cover the secondary resource; user was prompted again"
            );
        }

        Ok(acquired.token)
    }

    async fn secondary_request(
        &self,
        resource: &DiscoveredResourceId,
        secondary: &AccessToken,
    ) -> Result<String, FlowError> {
        let phase = FlowPhase::SecondaryRequest;
        let url = self
            .config
            .secondary_api_url(resource.as_str())
            .map_err(|e| FlowError::new(phase, e))?;

        self.api
            .get_authenticated(&url, secondary)
            .await
            .map_err(|e| FlowError::new(phase, e))
    }
}
