//! Traits for token grant operations
//!
//! Abstracts the identity provider so [`TokenCache`](super::TokenCache) can be
//! tested without a network.

use async_trait::async_trait;

use super::client::TokenGrantError;
use super::types::TokenGrantResponse;

/// Trait for acquiring a fresh access token from an identity provider
#[async_trait]
pub trait TokenGrantClient: Send + Sync {
    /// Perform one grant request
    ///
    /// # Errors
    /// Returns error if the request fails, the provider rejects the
    /// credentials, or the response cannot be parsed
    async fn request_token(&self) -> Result<TokenGrantResponse, TokenGrantError>;
}
