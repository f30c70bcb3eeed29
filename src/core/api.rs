//! API Client
//!
//! Authenticated GET calls against the primary and secondary resource APIs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::core::transport::{HttpRequest, HttpTransport, ReqwestHttpTransport};
use crate::error::HttpError;
use crate::types::AccessToken;

/// Resource API client interface.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// GET `uri` with `token` as bearer credential and return the raw body.
    async fn get_authenticated(&self, uri: &str, token: &AccessToken) -> Result<String, HttpError>;
}

/// [`ApiClient`] over an [`HttpTransport`].
pub struct HttpApiClient<T: HttpTransport = ReqwestHttpTransport> {
    transport: Arc<T>,
}

impl HttpApiClient<ReqwestHttpTransport> {
    /// Create a client with the default reqwest transport.
    pub fn new() -> Result<Self, HttpError> {
        Ok(Self::with_transport(Arc::new(ReqwestHttpTransport::new()?)))
    }
}

impl<T: HttpTransport> HttpApiClient<T> {
    pub fn with_transport(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: HttpTransport> ApiClient for HttpApiClient<T> {
    async fn get_authenticated(&self, uri: &str, token: &AccessToken) -> Result<String, HttpError> {
        let request = HttpRequest::get(uri)
            .header("authorization", token.authorization_header())
            .header("accept", "application/json");

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            tracing::warn!(status = response.status, uri, "Resource API call failed");
            return Err(HttpError::Status {
                status: response.status,
                url: uri.to_string(),
                body: response.body,
            });
        }

        Ok(response.body)
    }
}

/// Recorded [`ApiClient`] call.
#[derive(Clone, Debug)]
pub struct ApiCall {
    pub uri: String,
    /// Secret of the token the call was made with.
    pub token: String,
}

/// Mock API client for testing.
#[derive(Default)]
pub struct MockApiClient {
    responses: Mutex<VecDeque<Result<String, HttpError>>>,
    history: Mutex<Vec<ApiCall>>,
}

impl MockApiClient {
    /// Create new mock API client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response body; bodies are returned in the order queued.
    pub fn queue_body(&self, body: impl Into<String>) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    /// Queue a failure.
    pub fn queue_error(&self, error: HttpError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Get call history.
    pub fn get_calls(&self) -> Vec<ApiCall> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn get_authenticated(&self, uri: &str, token: &AccessToken) -> Result<String, HttpError> {
        self.history.lock().unwrap().push(ApiCall {
            uri: uri.to_string(),
            token: token.secret().to_string(),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(HttpError::ConnectionFailed {
                    message: "No mock response available".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::MockHttpTransport;
    use crate::types::ScopeSet;

    fn token() -> AccessToken {
        AccessToken::bearer("graph-token", ScopeSet::single("A/read").unwrap())
    }

    #[tokio::test]
    async fn test_sends_bearer_header() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &serde_json::json!({"webUrl": "https://x"}));

        let client = HttpApiClient::with_transport(transport.clone());
        let body = client
            .get_authenticated("https://graph.example/v1.0/sites/root", &token())
            .await
            .unwrap();

        assert!(body.contains("webUrl"));
        let request = transport.get_last_request().unwrap();
        assert_eq!(request.headers["authorization"], "Bearer graph-token");
        assert_eq!(request.url, "https://graph.example/v1.0/sites/root");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(403, &serde_json::json!({"error": "forbidden"}));

        let client = HttpApiClient::with_transport(transport);
        let result = client.get_authenticated("https://graph.example/me", &token()).await;

        match result {
            Err(HttpError::Status { status, body, .. }) => {
                assert_eq!(status, 403);
                assert!(body.contains("forbidden"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mock_api_client_records_calls() {
        let client = MockApiClient::new();
        client.queue_body("first");

        assert_eq!(client.get_authenticated("u1", &token()).await.unwrap(), "first");
        assert!(client.get_authenticated("u2", &token()).await.is_err());

        let calls = client.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].token, "graph-token");
    }
}
