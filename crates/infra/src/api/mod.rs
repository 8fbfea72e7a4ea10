//! QueryDesk backend API client
//!
//! Authenticated JSON client used by the admin console and, through
//! [`CachedCredentialsContext`], by backend services.
//!
//! # Architecture
//!
//! - Transport through [`HttpClient`](crate::http::HttpClient) (no direct
//!   reqwest client construction)
//! - Bearer token from an injected [`AuthContext`]
//! - One refresh-and-retry per call on 401, bounded by [`Attempt`]
//! - Structured [`ApiErrorResponse`](querydesk_domain::ApiErrorResponse)
//!   bodies surfaced as [`ApiError::Api`], everything else as
//!   [`ApiError::Unhandled`]
//! - Cooperative cancellation through [`AbortSignal`]

pub mod auth;
pub mod cancel;
pub mod client;
pub mod errors;
pub mod request;

pub use auth::{AuthContext, CachedCredentialsContext, CallbackRedirect, LoginRedirect};
pub use cancel::AbortSignal;
pub use client::{ApiClient, ApiClientBuilder, Attempt};
pub use errors::{ApiError, ApiErrorCategory};
pub use request::{ApiRequest, MultipartForm, RequestBody};
