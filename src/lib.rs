//! Consolidated Consent
//!
//! Silent-first OAuth2/OIDC token acquisition for two resources behind one
//! interactive consent.
//!
//! # Features
//!
//! - Silent acquisition from cached tokens and refresh material
//! - Interactive fallback only when the provider requires the user
//! - Scope consolidation: secondary scopes consented in the primary prompt
//! - Two-phase discovery of a secondary resource known only at runtime
//!
//! # Example
//!
//! ```rust,ignore
//! use consolidated_consent::{authority_config, flow_config, ConsentClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     consolidated_consent::LoggingConfig::from_env().init()?;
//!
//!     let authority = authority_config().from_env().build()?;
//!     let flow = flow_config().from_env().build()?;
//!
//!     // `BrowserPrompt` implements `AuthorizationPrompt` for your UI toolkit
//!     let client = ConsentClient::new(authority, flow, BrowserPrompt::default())?;
//!     let body = client.run().await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: accounts, scope sets, tokens and configuration
//! - `error`: error hierarchy and token endpoint error mapping
//! - `builders`: fluent configuration builders
//! - `core`: HTTP transport and the resource API client
//! - `token`: token cache and refresh token redemption
//! - `flows`: silent and interactive authenticators
//! - `orchestrator`: silent-first acquisition state machine
//! - `discovery`: the two-phase resource discovery flow
//! - `client`: default wiring of all of the above
//! - `telemetry`: `tracing` subscriber setup

pub mod builders;
pub mod client;
pub mod core;
pub mod discovery;
pub mod error;
pub mod flows;
pub mod orchestrator;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{ClientDiscoveryFlow, ClientOrchestrator, ConsentClient};

// Re-export builders
pub use builders::{authority_config, flow_config, AuthorityConfigBuilder, FlowConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, map_token_error, parse_error_response, AuthError, CacheError,
    ConfigurationError, ConsentError, ConsentResult, DiscoveryError, FlowError, FlowPhase,
    HttpError, InteractionReason, SilentAuthError, TokenErrorResponse,
};

// Re-export types
pub use types::{
    // Account
    Account,
    // Scopes
    ExtraConsentSet, ScopeSet, RESERVED_SCOPES,
    // Token
    AccessToken, TokenResponse,
    // Auth
    InteractiveGrant, InteractiveRequest, SELECT_ACCOUNT_PROMPT,
    // Config
    AuthorityConfig, FlowConfig,
};

// Re-export core components
pub use core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // API
    ApiCall, ApiClient, HttpApiClient, MockApiClient,
};

// Re-export token management
pub use token::{
    // Cache
    InMemoryTokenCache, MockTokenCache, TokenCache,
    // Redeemer
    HttpRefreshTokenRedeemer, MockRefreshTokenRedeemer, RefreshTokenRedeemer,
};

// Re-export flows
pub use flows::{
    // Silent
    CachedSilentAuthenticator, MockSilentAuthenticator, SilentAuthenticator, SilentCall,
    // Interactive
    AuthorizationPrompt, CachingInteractiveAuthenticator, InteractiveAuthenticator,
    InteractiveCall, MockAuthorizationPrompt, MockInteractiveAuthenticator,
};

// Re-export orchestration
pub use discovery::{DiscoveredResourceId, FlowState, ResourceDiscoveryFlow};
pub use orchestrator::{AcquiredToken, AcquisitionPath, TokenAcquisitionOrchestrator};

// Re-export telemetry
pub use telemetry::{LogFormat, LogLevel, LoggingConfig};
