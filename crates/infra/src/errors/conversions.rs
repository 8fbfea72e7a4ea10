//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use querydesk_domain::QueryDeskError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub QueryDeskError);

impl From<InfraError> for QueryDeskError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<QueryDeskError> for InfraError {
    fn from(value: QueryDeskError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoQueryDeskError {
    fn into_querydesk(self) -> QueryDeskError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → QueryDeskError */
/* -------------------------------------------------------------------------- */

impl IntoQueryDeskError for HttpError {
    fn into_querydesk(self) -> QueryDeskError {
        if self.is_timeout() {
            return QueryDeskError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return QueryDeskError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return QueryDeskError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() || self.is_body() {
            return QueryDeskError::Network(format!("failed to read HTTP body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => QueryDeskError::Auth(message),
                400..=499 => QueryDeskError::InvalidInput(message),
                _ => QueryDeskError::Network(message),
            };
        }

        QueryDeskError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_querydesk())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → QueryDeskError */
/* -------------------------------------------------------------------------- */

impl IntoQueryDeskError for IoError {
    fn into_querydesk(self) -> QueryDeskError {
        match self.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                QueryDeskError::Config(format!("unable to read file: {self}"))
            }
            ErrorKind::InvalidData => {
                QueryDeskError::Config(format!("file is not valid UTF-8: {self}"))
            }
            _ => QueryDeskError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_querydesk())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
