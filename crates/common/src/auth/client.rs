//! Client-credentials grant client
//!
//! Posts the service's client id/secret to the identity provider's token
//! endpoint and returns the issued access token with its lifetime.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::traits::TokenGrantClient;
use super::types::{ClientCredentials, ClientCredentialsGrant, OAuthError, TokenGrantResponse};

/// Error type for token grant operations
#[derive(Debug)]
pub enum TokenGrantError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// Identity provider returned an OAuth error body
    OAuthError { status: u16, error: OAuthError },

    /// Identity provider returned a non-2xx status without an OAuth error body
    UnexpectedStatus { status: u16, body: String },

    /// Failed to parse a successful response
    ParseError(String),

    /// Invalid configuration
    ConfigError(String),
}

impl std::fmt::Display for TokenGrantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::OAuthError { status, error } => {
                write!(f, "Identity provider rejected grant ({status}): {error}")
            }
            Self::UnexpectedStatus { status, body } => {
                write!(f, "Identity provider returned status {status}: {body}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for TokenGrantError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RequestFailed(e) => Some(e),
            Self::OAuthError { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TokenGrantError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// Client-credentials grant against an OAuth 2.0 token endpoint
#[derive(Debug, Clone)]
pub struct ClientCredentialsClient {
    credentials: ClientCredentials,
    client: Client,
}

impl ClientCredentialsClient {
    /// Create a grant client with a default reqwest client
    ///
    /// # Errors
    /// Returns `ConfigError` if any credential field is empty
    pub fn new(credentials: ClientCredentials) -> Result<Self, TokenGrantError> {
        Self::with_http_client(credentials, Client::new())
    }

    /// Create a grant client sharing an existing reqwest client
    ///
    /// # Errors
    /// Returns `ConfigError` if any credential field is empty
    pub fn with_http_client(
        credentials: ClientCredentials,
        client: Client,
    ) -> Result<Self, TokenGrantError> {
        let missing = [
            ("token_url", &credentials.token_url),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("audience", &credentials.audience),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = missing {
            return Err(TokenGrantError::ConfigError(format!("{field} must not be empty")));
        }

        Ok(Self { credentials, client })
    }

    /// Get the configured credentials
    #[must_use]
    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Request a new access token
    ///
    /// # Errors
    /// Returns error if:
    /// - The HTTP request fails
    /// - The provider answers with a non-2xx status
    /// - The response body is not a token response
    #[instrument(skip(self), fields(token_url = %self.credentials.token_url))]
    pub async fn request_token(&self) -> Result<TokenGrantResponse, TokenGrantError> {
        debug!(client_id = %self.credentials.client_id, "Requesting client-credentials token");

        let response = self
            .client
            .post(&self.credentials.token_url)
            .json(&ClientCredentialsGrant::from(&self.credentials))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OAuthError>(&body) {
                Ok(error) => TokenGrantError::OAuthError { status: status.as_u16(), error },
                Err(_) => TokenGrantError::UnexpectedStatus { status: status.as_u16(), body },
            });
        }

        let grant: TokenGrantResponse =
            response.json().await.map_err(|e| TokenGrantError::ParseError(e.to_string()))?;

        debug!(expires_in = grant.expires_in, "Client-credentials token issued");

        Ok(grant)
    }
}

#[async_trait]
impl TokenGrantClient for ClientCredentialsClient {
    async fn request_token(&self) -> Result<TokenGrantResponse, TokenGrantError> {
        self.request_token().await
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::client.
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn credentials_for(server: &MockServer) -> ClientCredentials {
        ClientCredentials::new(
            format!("{}/oauth/token", server.uri()),
            "bot-client",
            "bot-secret",
            "https://api.querydesk.dev",
        )
    }

    /// Validates the grant request shape and the parsed token response.
    ///
    /// Assertions:
    /// - The POST body carries client id, secret, audience and grant type.
    /// - `grant.access_token` equals `"abc"` and `grant.expires_in` equals
    ///   `86400`.
    #[tokio::test]
    async fn test_request_token_posts_client_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "client_id": "bot-client",
                "client_secret": "bot-secret",
                "audience": "https://api.querydesk.dev",
                "grant_type": "client_credentials",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc",
                "expires_in": 86400,
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClientCredentialsClient::new(credentials_for(&server)).unwrap();
        let grant = client.request_token().await.unwrap();

        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.expires_in, 86400);
    }

    /// Validates that OAuth error bodies are surfaced with their status.
    ///
    /// Assertions:
    /// - Ensures the result is `TokenGrantError::OAuthError` with status 401
    ///   and error `"access_denied"`.
    #[tokio::test]
    async fn test_request_token_surfaces_oauth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "access_denied",
                "error_description": "Unauthorized",
            })))
            .mount(&server)
            .await;

        let client = ClientCredentialsClient::new(credentials_for(&server)).unwrap();
        let result = client.request_token().await;

        match result {
            Err(TokenGrantError::OAuthError { status, error }) => {
                assert_eq!(status, 401);
                assert_eq!(error.error, "access_denied");
            }
            other => panic!("expected OAuth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_token_keeps_unstructured_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = ClientCredentialsClient::new(credentials_for(&server)).unwrap();
        let result = client.request_token().await;

        assert!(matches!(
            result,
            Err(TokenGrantError::UnexpectedStatus { status: 503, ref body }) if body == "upstream unavailable"
        ));
    }

    #[tokio::test]
    async fn test_request_token_rejects_malformed_success_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ClientCredentialsClient::new(credentials_for(&server)).unwrap();
        let result = client.request_token().await;

        assert!(matches!(result, Err(TokenGrantError::ParseError(_))));
    }

    #[test]
    fn test_empty_credentials_are_rejected() {
        let credentials =
            ClientCredentials::new("https://idp/oauth/token", "client", "", "https://api");

        let result = ClientCredentialsClient::new(credentials);
        assert!(
            matches!(result, Err(TokenGrantError::ConfigError(ref msg)) if msg.contains("client_secret"))
        );
    }
}
