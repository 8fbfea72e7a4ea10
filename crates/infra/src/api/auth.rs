//! Authentication seams for the API client
//!
//! The client never owns credentials. It asks an [`AuthContext`] for the
//! current bearer token, asks it to refresh once after a 401, and hands
//! control to a [`LoginRedirect`] when the session cannot be recovered.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use querydesk_common::auth::{TokenCache, TokenGrantClient};
use querydesk_common::time::{Clock, SystemClock};
use tracing::{debug, info, warn};

use super::errors::ApiError;

/// Source of the bearer token attached to API calls
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AuthContext: Send + Sync {
    /// Current token, or `None` while the user is not signed in
    ///
    /// # Errors
    /// Returns `ApiError::Auth` when the context failed to obtain a token
    async fn token(&self) -> Result<Option<String>, ApiError>;

    /// Obtain a fresh token so the next [`token`](Self::token) call returns it
    async fn fetch_token(&self) -> Result<(), ApiError>;
}

/// Navigation hook invoked when authentication cannot be recovered
pub trait LoginRedirect: Send + Sync {
    /// Send the user to the login route
    fn redirect_to_login(&self);
}

/// [`AuthContext`] backed by a service [`TokenCache`].
///
/// Lets a backend process call the API with client credentials. A refresh
/// drops the cached token and grants a new one.
pub struct CachedCredentialsContext<C: TokenGrantClient + 'static, K: Clock = SystemClock> {
    cache: Arc<TokenCache<C, K>>,
}

impl<C: TokenGrantClient + 'static, K: Clock> CachedCredentialsContext<C, K> {
    /// Wrap a shared service token cache
    pub fn new(cache: Arc<TokenCache<C, K>>) -> Self {
        Self { cache }
    }

    /// The underlying cache
    pub fn cache(&self) -> &Arc<TokenCache<C, K>> {
        &self.cache
    }
}

#[async_trait]
impl<C: TokenGrantClient + 'static, K: Clock> AuthContext for CachedCredentialsContext<C, K> {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        match self.cache.get_token().await {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!(error = %e, "Service token unavailable");
                Err(ApiError::Auth(format!("Failed to obtain service token: {e}")))
            }
        }
    }

    async fn fetch_token(&self) -> Result<(), ApiError> {
        debug!("Discarding rejected service token");
        self.cache.invalidate().await;
        self.cache
            .get_token()
            .await
            .map(|_| ())
            .map_err(|e| ApiError::Auth(format!("Failed to refresh service token: {e}")))
    }
}

/// [`LoginRedirect`] that hands the configured login route to a callback
pub struct CallbackRedirect {
    login_route: String,
    navigate: Box<dyn Fn(&str) + Send + Sync>,
}

impl CallbackRedirect {
    /// Redirect that calls `navigate` with `login_route`
    pub fn new(
        login_route: impl Into<String>,
        navigate: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        Self { login_route: login_route.into(), navigate: Box::new(navigate) }
    }

    /// Route handed to the callback
    pub fn login_route(&self) -> &str {
        &self.login_route
    }
}

impl LoginRedirect for CallbackRedirect {
    fn redirect_to_login(&self) {
        info!(route = %self.login_route, "Redirecting to login");
        (self.navigate)(&self.login_route);
    }
}

impl fmt::Debug for CallbackRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRedirect").field("login_route", &self.login_route).finish()
    }
}
