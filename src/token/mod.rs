//! Token Management
//!
//! Token cache and refresh token redemption.
//!
//! This module provides:
//!
//! - **Token Cache**: accounts, access tokens keyed by (account, scope set),
//!   and per-account refresh material
//! - **Refresh Token Redeemer**: exchanges refresh material for a token
//!   scoped to another resource

pub mod cache;
pub mod redeemer;

// Token Cache
pub use cache::{InMemoryTokenCache, MockTokenCache, TokenCache};

// Refresh Token Redeemer
pub use redeemer::{HttpRefreshTokenRedeemer, MockRefreshTokenRedeemer, RefreshTokenRedeemer};
