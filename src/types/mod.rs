//! Consent Types
//!
//! Core type definitions for token acquisition and resource discovery.

pub mod account;
pub mod auth;
pub mod config;
pub mod scope;
pub mod token;

pub use account::*;
pub use auth::*;
pub use config::*;
pub use scope::*;
pub use token::*;
