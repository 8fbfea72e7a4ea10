//! Wire types shared between the API client and its callers

use serde::{Deserialize, Serialize};

use crate::constants::{UNHANDLED_ERROR_CODE, UNHANDLED_ERROR_MESSAGE};

/// Structured failure payload returned by the backend on non-2xx responses.
///
/// Callers render the code/message/trace triad directly, e.g. as a toast that
/// shows the trace id a user can hand to support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code (e.g. `"QUERY_TIMEOUT"`)
    pub error_code: String,
    /// Human-readable description
    pub message: String,
    /// Identifier for support correlation
    pub trace_id: String,
}

impl ApiErrorResponse {
    /// Build a structured error
    #[must_use]
    pub fn new(
        error_code: impl Into<String>,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self { error_code: error_code.into(), message: message.into(), trace_id: trace_id.into() }
    }

    /// Build the synthetic error used for bodies that are not well-formed.
    ///
    /// An empty `detail` falls back to a generic message. The trace id is left
    /// empty because the backend never assigned one.
    #[must_use]
    pub fn unhandled(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let message =
            if detail.trim().is_empty() { UNHANDLED_ERROR_MESSAGE.to_string() } else { detail };

        Self { error_code: UNHANDLED_ERROR_CODE.to_string(), message, trace_id: String::new() }
    }

    /// Whether this value is the synthetic unhandled error
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        self.error_code == UNHANDLED_ERROR_CODE
    }
}
