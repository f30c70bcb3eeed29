//! Builders
//!
//! Fluent builders for authority and flow configuration.

pub mod config;

pub use config::{authority_config, flow_config, AuthorityConfigBuilder, FlowConfigBuilder};
