//! Client-credentials token types
//!
//! Data structures exchanged with the identity provider's `/oauth/token`
//! endpoint and the cached token held by [`TokenCache`](super::TokenCache).

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// OAuth grant type sent by [`ClientCredentialsClient`](super::ClientCredentialsClient)
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Bearer token plus the instant it stops being usable
///
/// Replaced wholesale on every refresh; never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    /// Create a token that expires at `expires_at`
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self { value: value.into(), expires_at }
    }

    /// Create a token issued at `issued_at` with a lifetime in seconds.
    ///
    /// Returns `None` when the expiry instant is not representable.
    #[must_use]
    pub fn issued(
        value: impl Into<String>,
        issued_at: Instant,
        expires_in_secs: u64,
    ) -> Option<Self> {
        let expires_at = issued_at.checked_add(Duration::from_secs(expires_in_secs))?;
        Some(Self::new(value, expires_at))
    }

    /// The opaque bearer string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Instant at which the token is no longer valid
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// `true` while `now` is strictly before the expiry instant
    #[must_use]
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Remaining lifetime, zero once expired
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credentials for the client-credentials grant
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Token endpoint, normally `https://{domain}/oauth/token`
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// API identifier the token is issued for
    pub audience: String,
}

impl ClientCredentials {
    /// Create credentials for the given token endpoint
    #[must_use]
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            audience: audience.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("audience", &self.audience)
            .finish()
    }
}

/// Request body posted to the token endpoint
#[derive(Debug, Serialize)]
pub(crate) struct ClientCredentialsGrant<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub audience: &'a str,
    pub grant_type: &'static str,
}

impl<'a> From<&'a ClientCredentials> for ClientCredentialsGrant<'a> {
    fn from(credentials: &'a ClientCredentials) -> Self {
        Self {
            client_id: &credentials.client_id,
            client_secret: &credentials.client_secret,
            audience: &credentials.audience,
            grant_type: GRANT_TYPE_CLIENT_CREDENTIALS,
        }
    }
}

/// Successful token endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrantResponse {
    pub access_token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenGrantResponse {
    /// Convenience constructor used by tests and mocks
    #[must_use]
    pub fn bearer(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
            token_type: Some("Bearer".to_string()),
            scope: None,
        }
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
