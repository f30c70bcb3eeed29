//! Consent Error Types
//!
//! Error hierarchy for token acquisition and resource discovery.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::discovery::FlowState;

/// Root error type for the consolidated consent integration.
#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

impl ConsentError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONSENT_CONFIG",
            Self::Auth(_) => "CONSENT_AUTH",
            Self::Discovery(_) => "CONSENT_DISCOVERY",
            Self::Http(_) => "CONSENT_HTTP",
        }
    }

    /// Check if restarting the whole flow could plausibly succeed.
    ///
    /// Nothing inside the crate retries; this is a hint for the caller.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_transient(),
            Self::Auth(AuthError::Transport(e)) => e.is_transient(),
            Self::Auth(AuthError::Provider { code, .. }) => {
                code == "temporarily_unavailable" || code == "server_error"
            }
            _ => false,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid scope: {message}")]
    InvalidScope { message: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Consent hint scope {scope} does not end with /{suffix}")]
    InconsistentConsolidation { scope: String, suffix: String },
}

/// Why silent acquisition needs the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionReason {
    /// No account, token, or refresh material in the cache.
    NoCachedMaterial,
    /// The provider requires consent for the requested scopes.
    ConsentRequired,
    /// The provider requires the user to sign in again.
    LoginRequired,
    /// The refresh token was rejected (expired, revoked, wrong audience).
    InvalidGrant,
}

impl InteractionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCachedMaterial => "no_cached_material",
            Self::ConsentRequired => "consent_required",
            Self::LoginRequired => "login_required",
            Self::InvalidGrant => "invalid_grant",
        }
    }
}

impl fmt::Display for InteractionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a failed silent acquisition.
///
/// `InteractionRequired` is the only failure the orchestrator recovers from.
#[derive(Error, Debug)]
pub enum SilentAuthError {
    #[error("User interaction required ({reason})")]
    InteractionRequired { reason: InteractionReason },

    #[error(transparent)]
    Failed(#[from] AuthError),
}

impl SilentAuthError {
    pub fn interaction_required(reason: InteractionReason) -> Self {
        Self::InteractionRequired { reason }
    }

    pub fn is_interaction_required(&self) -> bool {
        matches!(self, Self::InteractionRequired { .. })
    }
}

impl From<CacheError> for SilentAuthError {
    fn from(error: CacheError) -> Self {
        Self::Failed(AuthError::Cache(error))
    }
}

/// Fatal authentication failure.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Interactive sign-in was cancelled by the user")]
    Cancelled,

    #[error("Access denied by user")]
    AccessDenied { error_description: Option<String> },

    #[error("Invalid scope: {scope}")]
    InvalidScope { scope: String },

    #[error("Provider error {code}: {}", .description.as_deref().unwrap_or("no description"))]
    Provider {
        code: String,
        description: Option<String>,
    },

    #[error("Invalid token response: {message}")]
    InvalidResponse { message: String },

    #[error("Identity provider unreachable: {0}")]
    Transport(#[from] HttpError),

    #[error("Token cache failure: {0}")]
    Cache(#[from] CacheError),
}

/// Discovery response could not yield a resource identifier.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid JSON in discovery response: {message}")]
    InvalidJson { message: String },

    #[error("Discovery response has no field {field}")]
    MissingField { field: String },

    #[error("Discovery field {field} is not a string")]
    InvalidField { field: String },

    #[error("Invalid resource identifier {value:?}: {reason}")]
    InvalidResourceId { value: String, reason: String },
}

/// Transport-level failure talking to an HTTP endpoint.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Unreadable response body: {message}")]
    InvalidBody { message: String },

    #[error("HTTP {status} from {url}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
}

impl HttpError {
    /// Check if error is transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

/// Token cache failure.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },
}

/// Step of the discovery flow that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowPhase {
    /// Listing cached accounts and acquiring the primary token.
    PrimaryAcquisition,
    /// Calling the primary API and extracting the resource identifier.
    ResourceDiscovery,
    /// Re-listing accounts and acquiring the secondary token.
    SecondaryAcquisition,
    /// Calling the secondary API.
    SecondaryRequest,
}

impl fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PrimaryAcquisition => "primary token acquisition",
            Self::ResourceDiscovery => "resource discovery",
            Self::SecondaryAcquisition => "secondary token acquisition",
            Self::SecondaryRequest => "secondary API request",
        };
        f.write_str(name)
    }
}

/// Failure of the discovery flow, tagged with the phase that failed.
#[derive(Error, Debug)]
#[error("{phase} failed: {source}")]
pub struct FlowError {
    pub phase: FlowPhase,
    #[source]
    pub source: ConsentError,
}

impl FlowError {
    pub fn new(phase: FlowPhase, source: impl Into<ConsentError>) -> Self {
        Self {
            phase,
            source: source.into(),
        }
    }

    /// Last state the flow reached before failing.
    pub fn reached(&self) -> FlowState {
        match self.phase {
            FlowPhase::PrimaryAcquisition => FlowState::Start,
            FlowPhase::ResourceDiscovery => FlowState::PrimaryTokenAcquired,
            FlowPhase::SecondaryAcquisition => FlowState::ResourceDiscovered,
            FlowPhase::SecondaryRequest => FlowState::SecondaryTokenAcquired,
        }
    }

    /// Whether the failure happened before a resource identifier was known.
    pub fn before_discovery(&self) -> bool {
        matches!(
            self.phase,
            FlowPhase::PrimaryAcquisition | FlowPhase::ResourceDiscovery
        )
    }
}

/// Result type for consent operations.
pub type ConsentResult<T> = Result<T, ConsentError>;

/// OAuth2 error response from the token endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub suberror: Option<String>,
}

/// Classify a token endpoint error response.
pub fn map_token_error(response: &TokenErrorResponse) -> SilentAuthError {
    match response.error.as_str() {
        "interaction_required" => {
            if response.suberror.as_deref() == Some("consent_required") {
                SilentAuthError::interaction_required(InteractionReason::ConsentRequired)
            } else {
                SilentAuthError::interaction_required(InteractionReason::LoginRequired)
            }
        }
        "consent_required" => {
            SilentAuthError::interaction_required(InteractionReason::ConsentRequired)
        }
        "login_required" => SilentAuthError::interaction_required(InteractionReason::LoginRequired),
        "invalid_grant" => match response.suberror.as_deref() {
            Some("consent_required") => {
                SilentAuthError::interaction_required(InteractionReason::ConsentRequired)
            }
            _ => SilentAuthError::interaction_required(InteractionReason::InvalidGrant),
        },
        "invalid_scope" => SilentAuthError::Failed(AuthError::InvalidScope {
            scope: response.error_description.clone().unwrap_or_default(),
        }),
        "access_denied" => SilentAuthError::Failed(AuthError::AccessDenied {
            error_description: response.error_description.clone(),
        }),
        other => SilentAuthError::Failed(AuthError::Provider {
            code: other.to_string(),
            description: response.error_description.clone(),
        }),
    }
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<TokenErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Classify a non-success token endpoint response.
pub fn create_error_from_response(status: u16, url: &str, body: &str) -> SilentAuthError {
    if let Some(response) = parse_error_response(body) {
        return map_token_error(&response);
    }

    SilentAuthError::Failed(AuthError::Transport(HttpError::Status {
        status,
        url: url.to_string(),
        body: body.to_string(),
    }))
}
