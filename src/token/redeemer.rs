//! Refresh Token Redemption
//!
//! Exchanges an account's refresh token for an access token scoped to a
//! different resource, as consented earlier.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex};
use url::form_urlencoded;

use crate::core::{HttpRequest, HttpTransport, ReqwestHttpTransport};
use crate::error::{create_error_from_response, AuthError, SilentAuthError};
use crate::types::{AuthorityConfig, ScopeSet, TokenResponse, RESERVED_SCOPES};

/// Refresh token redemption interface.
#[async_trait]
pub trait RefreshTokenRedeemer: Send + Sync {
    /// Redeem `refresh_token` for a token covering `scopes`.
    ///
    /// Provider answers that need the user map to
    /// [`SilentAuthError::InteractionRequired`].
    async fn redeem(
        &self,
        refresh_token: &SecretString,
        scopes: &ScopeSet,
    ) -> Result<TokenResponse, SilentAuthError>;
}

/// Redeemer posting to the authority's token endpoint.
pub struct HttpRefreshTokenRedeemer<T: HttpTransport = ReqwestHttpTransport> {
    config: AuthorityConfig,
    transport: Arc<T>,
}

impl<T: HttpTransport> HttpRefreshTokenRedeemer<T> {
    /// Create new redeemer.
    pub fn new(config: AuthorityConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    fn build_request_body(&self, refresh_token: &SecretString, scopes: &ScopeSet) -> String {
        let mut scope_param: Vec<&str> = scopes.iter().collect();
        for reserved in RESERVED_SCOPES {
            if !scopes.contains(reserved) {
                scope_param.push(reserved);
            }
        }

        form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.config.client_id)
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", refresh_token.expose_secret())
            .append_pair("scope", &scope_param.join(" "))
            .finish()
    }
}

#[async_trait]
impl<T: HttpTransport> RefreshTokenRedeemer for HttpRefreshTokenRedeemer<T> {
    async fn redeem(
        &self,
        refresh_token: &SecretString,
        scopes: &ScopeSet,
    ) -> Result<TokenResponse, SilentAuthError> {
        let url = self.config.token_endpoint();
        let request = HttpRequest::post_form(&url, self.build_request_body(refresh_token, scopes))
            .header("accept", "application/json")
            .timeout(self.config.timeout);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(AuthError::Transport)?;

        if !response.is_success() {
            return Err(create_error_from_response(
                response.status,
                &url,
                &response.body,
            ));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            SilentAuthError::Failed(AuthError::InvalidResponse {
                message: e.to_string(),
            })
        })
    }
}

/// Mock refresh token redeemer for testing.
#[derive(Default)]
pub struct MockRefreshTokenRedeemer {
    history: Mutex<Vec<ScopeSet>>,
    next_error: Mutex<Option<SilentAuthError>>,
}

impl MockRefreshTokenRedeemer {
    /// Create new mock redeemer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next redemption.
    pub fn set_next_error(&self, error: SilentAuthError) -> &Self {
        *self.next_error.lock().unwrap() = Some(error);
        self
    }

    /// Scope sets redeemed so far.
    pub fn get_history(&self) -> Vec<ScopeSet> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefreshTokenRedeemer for MockRefreshTokenRedeemer {
    async fn redeem(
        &self,
        _refresh_token: &SecretString,
        scopes: &ScopeSet,
    ) -> Result<TokenResponse, SilentAuthError> {
        self.history.lock().unwrap().push(scopes.clone());

        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        Ok(TokenResponse {
            access_token: format!("redeemed-token-for-{}", scopes),
            token_type: "Bearer".to_string(),
            expires_in: Some(3600),
            refresh_token: Some("rotated-refresh-token".to_string()),
            scope: Some(scopes.to_scope_param()),
            id_token: None,
            extra: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::authority_config;
    use crate::core::MockHttpTransport;
    use crate::error::{HttpError, InteractionReason};

    fn redeemer(transport: Arc<MockHttpTransport>) -> HttpRefreshTokenRedeemer<MockHttpTransport> {
        let config = authority_config()
            .client_id("client-123")
            .authority("https://login.example.com/organizations")
            .build()
            .unwrap();
        HttpRefreshTokenRedeemer::new(config, transport)
    }

    fn secret() -> SecretString {
        SecretString::new("rt-1".to_string())
    }

    #[tokio::test]
    async fn test_redeem_posts_refresh_grant() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            200,
            &serde_json::json!({
                "access_token": "sp-token",
                "token_type": "Bearer",
                "expires_in": 3599,
                "scope": "https://x.sharepoint.com/allsites.manage"
            }),
        );

        let scopes = ScopeSet::single("https://x.sharepoint.com/allsites.manage").unwrap();
        let response = redeemer(transport.clone())
            .redeem(&secret(), &scopes)
            .await
            .unwrap();
        assert_eq!(response.access_token, "sp-token");

        let request = transport.get_last_request().unwrap();
        assert_eq!(
            request.url,
            "https://login.example.com/organizations/oauth2/v2.0/token"
        );
        let form: std::collections::HashMap<String, String> =
            form_urlencoded::parse(request.body.unwrap().as_bytes())
                .into_owned()
                .collect();
        assert_eq!(form["grant_type"], "refresh_token");
        assert_eq!(form["client_id"], "client-123");
        assert_eq!(form["refresh_token"], "rt-1");
        assert_eq!(
            form["scope"],
            "https://x.sharepoint.com/allsites.manage openid profile offline_access"
        );
    }

    #[tokio::test]
    async fn test_redeem_invalid_grant_requires_interaction() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            400,
            &serde_json::json!({"error": "invalid_grant", "error_description": "AADSTS65001"}),
        );

        let scopes = ScopeSet::single("B/manage").unwrap();
        let error = redeemer(transport).redeem(&secret(), &scopes).await.unwrap_err();
        assert!(matches!(
            error,
            SilentAuthError::InteractionRequired {
                reason: InteractionReason::InvalidGrant
            }
        ));
    }

    #[tokio::test]
    async fn test_redeem_transport_failure_is_fatal() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_error(HttpError::ConnectionFailed {
            message: "dns".to_string(),
        });

        let scopes = ScopeSet::single("B/manage").unwrap();
        let error = redeemer(transport).redeem(&secret(), &scopes).await.unwrap_err();
        assert!(matches!(
            error,
            SilentAuthError::Failed(AuthError::Transport(HttpError::ConnectionFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_redeem_malformed_body() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &serde_json::json!({"unexpected": true}));

        let scopes = ScopeSet::single("B/manage").unwrap();
        let error = redeemer(transport).redeem(&secret(), &scopes).await.unwrap_err();
        assert!(matches!(
            error,
            SilentAuthError::Failed(AuthError::InvalidResponse { .. })
        ));
    }
}
