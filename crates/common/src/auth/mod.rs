//! Service-to-service authentication
//!
//! Provides a client-credentials access token to backend processes (the
//! messaging bot and its installation store) with minimal round trips to the
//! identity provider.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   TokenCache    │  Single-slot cache, refresh on expiry
//! └────────┬────────┘
//!          │
//!          ├──► TokenGrantClient        (trait seam)
//!          │         │
//!          │         └──► ClientCredentialsClient  (POST /oauth/token)
//!          │
//!          └──► Clock                   (SystemClock / MockClock)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use querydesk_common::auth::{ClientCredentials, ClientCredentialsClient, TokenCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = ClientCredentials::new(
//!         "https://querydesk.us.auth0.com/oauth/token",
//!         "bot_client_id",
//!         "bot_client_secret",
//!         "https://api.querydesk.dev",
//!     );
//!
//!     let cache = Arc::new(TokenCache::new(ClientCredentialsClient::new(credentials)?));
//!
//!     // First call grants; later calls reuse the token until it expires
//!     let token = cache.get_token().await?;
//!     assert!(!token.is_empty());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `AccessToken`, `ClientCredentials`, grant request/response
//! - **[`client`]**: reqwest-backed client-credentials grant
//! - **[`token_cache`]**: the cache itself
//! - **[`traits`]**: `TokenGrantClient` seam for tests

pub mod client;
pub mod token_cache;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use client::{ClientCredentialsClient, TokenGrantError};
pub use token_cache::{TokenCache, TokenCacheBuilder};
pub use traits::TokenGrantClient;
pub use types::{
    AccessToken, ClientCredentials, OAuthError, TokenGrantResponse, GRANT_TYPE_CLIENT_CREDENTIALS,
};
