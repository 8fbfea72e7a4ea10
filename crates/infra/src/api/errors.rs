//! API-specific error types
//!
//! Every failure the browser client can produce collapses into [`ApiError`].
//! [`ApiError::error_response`] turns any of them into the code/message/trace
//! triad the UI renders.

use querydesk_domain::{ApiErrorResponse, QueryDeskError};
use thiserror::Error;

/// Categories of API errors for display and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Credentials missing, rejected, or not refreshable (401, 403)
    Authentication,
    /// Server errors (5xx) or unreadable success bodies
    Server,
    /// Client errors (4xx except auth)
    Client,
    /// Network/connection errors
    Network,
    /// Caller aborted the request
    Cancelled,
    /// Configuration or request construction errors
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend answered with a well-formed [`ApiErrorResponse`] body
    #[error("API error {status}: {} ({})", .error.error_code, .error.message)]
    Api { status: u16, error: ApiErrorResponse },

    /// Backend answered with a body that is not an [`ApiErrorResponse`]
    #[error("Unhandled API error {status}: {}", .error.message)]
    Unhandled { status: u16, error: ApiErrorResponse },

    /// Request still rejected after one token refresh
    #[error("Unauthorized: credentials rejected after token refresh")]
    Unauthorized,

    /// The auth context could not refresh the token after a 401
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ApiError>),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connect, DNS, TLS, timeout or body-read failure
    #[error("Transport error: {0}")]
    Transport(#[source] QueryDeskError),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// Non-2xx answer to a binary download; the body is kept as received
    #[error("Download failed with status {status}")]
    Download { status: u16, body: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// The structured error to show the user.
    ///
    /// Backend-provided bodies are returned unchanged; everything else becomes
    /// the synthetic unhandled error so callers never special-case it.
    pub fn error_response(&self) -> ApiErrorResponse {
        match self {
            Self::Api { error, .. } | Self::Unhandled { error, .. } => error.clone(),
            Self::Download { body, .. } if !body.trim().is_empty() => {
                ApiErrorResponse::unhandled(body.clone())
            }
            other => ApiErrorResponse::unhandled(other.to_string()),
        }
    }

    /// HTTP status behind this error, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. }
            | Self::Unhandled { status, .. }
            | Self::Download { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// Whether the backend supplied a structured error body
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Api { status, .. }
            | Self::Unhandled { status, .. }
            | Self::Download { status, .. } => Self::category_for_status(*status),
            Self::Unauthorized | Self::RefreshFailed(_) | Self::Auth(_) => {
                ApiErrorCategory::Authentication
            }
            Self::Transport(_) => ApiErrorCategory::Network,
            Self::Decode(_) => ApiErrorCategory::Server,
            Self::Cancelled => ApiErrorCategory::Cancelled,
            Self::Encode(_) | Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    fn category_for_status(status: u16) -> ApiErrorCategory {
        match status {
            401 | 403 => ApiErrorCategory::Authentication,
            500..=599 => ApiErrorCategory::Server,
            _ => ApiErrorCategory::Client,
        }
    }
}
