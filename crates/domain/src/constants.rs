//! Application constants
//!
//! Centralized location for domain-level constants shared by the API client
//! and the service token cache.

/// Error code carried by synthetic errors built from bodies that do not match
/// the structured API error shape.
pub const UNHANDLED_ERROR_CODE: &str = "UNHANDLED_ERROR";

/// Message used when an unstructured failure has no usable body.
pub const UNHANDLED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Default route the console sends users to when authentication is lost.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Default tracing filter when neither `RUST_LOG` nor config provide one.
pub const DEFAULT_LOG_FILTER: &str = "info";
