//! # QueryDesk Infrastructure
//!
//! I/O side of the QueryDesk API client core.
//!
//! This crate contains:
//! - The authenticated backend API client ([`api`])
//! - HTTP transport ([`http`])
//! - Configuration loading ([`config`])
//! - Logging setup ([`observability`])
//!
//! ## Architecture
//! - Depends on `querydesk-domain` for configuration and error types
//! - Depends on `querydesk-common` for the service token cache
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used items
pub use api::{
    AbortSignal, ApiClient, ApiError, ApiRequest, AuthContext, CachedCredentialsContext,
    LoginRedirect, MultipartForm,
};
pub use errors::InfraError;
pub use http::HttpClient;
