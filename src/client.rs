//! Consent Client
//!
//! Wires the cache-backed collaborators into an orchestrator and a
//! discovery flow sharing one token cache and one HTTP transport.

use std::sync::Arc;

use crate::core::{HttpApiClient, HttpTransport, ReqwestHttpTransport};
use crate::discovery::ResourceDiscoveryFlow;
use crate::error::{ConsentResult, FlowError};
use crate::flows::{AuthorizationPrompt, CachedSilentAuthenticator, CachingInteractiveAuthenticator};
use crate::orchestrator::TokenAcquisitionOrchestrator;
use crate::token::{HttpRefreshTokenRedeemer, InMemoryTokenCache};
use crate::types::{AuthorityConfig, FlowConfig};

/// Silent authenticator used by [`ConsentClient`].
pub type ClientSilentAuthenticator<T> =
    CachedSilentAuthenticator<InMemoryTokenCache, HttpRefreshTokenRedeemer<T>>;

/// Interactive authenticator used by [`ConsentClient`].
pub type ClientInteractiveAuthenticator<P> = CachingInteractiveAuthenticator<P, InMemoryTokenCache>;

/// Orchestrator built by [`ConsentClient::orchestrator`].
pub type ClientOrchestrator<P, T> =
    TokenAcquisitionOrchestrator<ClientSilentAuthenticator<T>, ClientInteractiveAuthenticator<P>>;

/// Discovery flow built by [`ConsentClient::discovery_flow`].
pub type ClientDiscoveryFlow<P, T> = ResourceDiscoveryFlow<
    ClientSilentAuthenticator<T>,
    ClientInteractiveAuthenticator<P>,
    InMemoryTokenCache,
    HttpApiClient<T>,
>;

/// Entry point for applications.
///
/// The application supplies the browser handshake as an
/// [`AuthorizationPrompt`]; everything else is built here.
pub struct ConsentClient<P: AuthorizationPrompt, T: HttpTransport = ReqwestHttpTransport> {
    authority: AuthorityConfig,
    flow: FlowConfig,
    prompt: Arc<P>,
    transport: Arc<T>,
    cache: Arc<InMemoryTokenCache>,
}

impl<P: AuthorizationPrompt> ConsentClient<P, ReqwestHttpTransport> {
    /// Create a client with the reqwest transport and an empty cache.
    pub fn new(authority: AuthorityConfig, flow: FlowConfig, prompt: P) -> ConsentResult<Self> {
        let transport = Arc::new(ReqwestHttpTransport::with_options(
            authority.timeout,
            crate::core::transport::DEFAULT_MAX_RESPONSE_SIZE,
        )?);

        Ok(Self::with_components(
            authority,
            flow,
            Arc::new(prompt),
            transport,
            Arc::new(InMemoryTokenCache::new()),
        ))
    }
}

impl<P: AuthorizationPrompt, T: HttpTransport> ConsentClient<P, T> {
    /// Create a client with custom components.
    pub fn with_components(
        authority: AuthorityConfig,
        flow: FlowConfig,
        prompt: Arc<P>,
        transport: Arc<T>,
        cache: Arc<InMemoryTokenCache>,
    ) -> Self {
        Self {
            authority,
            flow,
            prompt,
            transport,
            cache,
        }
    }

    pub fn authority(&self) -> &AuthorityConfig {
        &self.authority
    }

    /// Shared token cache.
    pub fn cache(&self) -> &Arc<InMemoryTokenCache> {
        &self.cache
    }

    /// Orchestrator over the shared cache.
    pub fn orchestrator(&self) -> ClientOrchestrator<P, T> {
        let redeemer = Arc::new(HttpRefreshTokenRedeemer::new(
            self.authority.clone(),
            self.transport.clone(),
        ));
        let silent = Arc::new(CachedSilentAuthenticator::new(
            self.cache.clone(),
            redeemer,
            self.authority.expiry_buffer,
        ));
        let interactive = Arc::new(CachingInteractiveAuthenticator::new(
            self.authority.clone(),
            self.prompt.clone(),
            self.cache.clone(),
        ));
        TokenAcquisitionOrchestrator::new(silent, interactive)
    }

    /// Discovery flow over the shared cache and transport.
    pub fn discovery_flow(&self) -> ClientDiscoveryFlow<P, T> {
        ResourceDiscoveryFlow::new(
            self.orchestrator(),
            self.cache.clone(),
            Arc::new(HttpApiClient::with_transport(self.transport.clone())),
            self.flow.clone(),
        )
    }

    /// Run the discovery flow once.
    pub async fn run(&self) -> Result<String, FlowError> {
        self.discovery_flow().run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{authority_config, flow_config};
    use crate::core::MockHttpTransport;
    use crate::flows::MockAuthorizationPrompt;
    use crate::token::TokenCache;
    use crate::types::Account;

    fn client(
        transport: Arc<MockHttpTransport>,
        prompt: Arc<MockAuthorizationPrompt>,
    ) -> ConsentClient<MockAuthorizationPrompt, MockHttpTransport> {
        let authority = authority_config()
            .client_id("client-123")
            .authority("https://login.example.com/organizations")
            .build()
            .unwrap();
        let flow = flow_config()
            .primary_scopes(["https://graph.example/sites.read"])
            .consent_hint_scopes(["https://contoso.sharepoint.com/allsites.manage"])
            .discovery_url("https://graph.example/v1.0/sites/root")
            .build()
            .unwrap();
        ConsentClient::with_components(
            authority,
            flow,
            prompt,
            transport,
            Arc::new(InMemoryTokenCache::new()),
        )
    }

    #[tokio::test]
    async fn test_single_prompt_then_silent_secondary() {
        let transport = Arc::new(MockHttpTransport::new());
        let prompt = Arc::new(MockAuthorizationPrompt::new(Account::new("acct1")));
        let client = client(transport.clone(), prompt.clone());

        // discovery, token redemption, secondary call
        transport.queue_json_response(200, &serde_json::json!({"webUrl": "https://x.sharepoint.com"}));
        transport.queue_json_response(
            200,
            &serde_json::json!({
                "access_token": "sp-token",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "rt-2"
            }),
        );
        transport.queue_json_response(200, &serde_json::json!({"Title": "Root"}));

        let body = client.run().await.unwrap();

        assert!(body.contains("Root"));
        assert_eq!(prompt.prompt_count(), 1);
        let requests = transport.get_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[1].url,
            "https://login.example.com/organizations/oauth2/v2.0/token"
        );
        assert_eq!(requests[2].url, "https://x.sharepoint.com/_api/web");
        assert_eq!(requests[2].headers["authorization"], "Bearer sp-token");
        let accounts = client.cache().list_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].environment.as_deref(), Some("login.example.com"));
    }
}
