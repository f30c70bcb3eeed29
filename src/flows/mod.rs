//! Acquisition Flows
//!
//! The two ways a token can be obtained:
//!
//! - **Silent**: from cached tokens or refresh material, never prompting
//! - **Interactive**: a browser sign-in that can consent to extra scopes

pub mod interactive;
pub mod silent;

// Interactive Acquisition
pub use interactive::{
    AuthorizationPrompt, CachingInteractiveAuthenticator, InteractiveAuthenticator,
    InteractiveCall, MockAuthorizationPrompt, MockInteractiveAuthenticator,
};

// Silent Acquisition
pub use silent::{
    CachedSilentAuthenticator, MockSilentAuthenticator, SilentAuthenticator, SilentCall,
};
