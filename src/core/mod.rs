//! Core Infrastructure
//!
//! HTTP transport and the resource API client.

pub mod api;
pub mod transport;

pub use api::{ApiCall, ApiClient, HttpApiClient, MockApiClient};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, ReqwestHttpTransport,
};
