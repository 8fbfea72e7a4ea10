//! Single-slot cache for a client-credentials access token
//!
//! Hands out the cached token while it is valid and performs one grant
//! request when it is missing or expired:
//! - No network call while `now < expires_at`
//! - On refresh, `expires_at = now + expires_in`
//! - Grant failures are logged and returned, never swallowed
//!
//! By default concurrent callers that find the slot stale each issue their own
//! grant and the last writer wins. Tokens are fungible, so the only cost is a
//! redundant round trip. [`TokenCacheBuilder::coalesce_refreshes`] queues
//! concurrent refreshes behind one in-flight grant instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use super::client::TokenGrantError;
use super::traits::TokenGrantClient;
use super::types::AccessToken;
use crate::time::{Clock, SystemClock};

/// Token cache for service-to-service calls
///
/// Construct once at process start and share through an `Arc`.
pub struct TokenCache<C: TokenGrantClient + 'static, K: Clock = SystemClock> {
    grant_client: Arc<C>,
    clock: K,
    slot: RwLock<Option<AccessToken>>,
    refresh_guard: Option<Mutex<()>>,
}

impl<C: TokenGrantClient + 'static> TokenCache<C, SystemClock> {
    /// Create a cache backed by the system clock
    #[must_use]
    pub fn new(grant_client: C) -> Self {
        Self::builder(grant_client).build()
    }

    /// Start building a cache with custom options
    #[must_use]
    pub fn builder(grant_client: C) -> TokenCacheBuilder<C, SystemClock> {
        TokenCacheBuilder { grant_client, clock: SystemClock, coalesce_refreshes: false }
    }
}

impl<C: TokenGrantClient + 'static, K: Clock> TokenCache<C, K> {
    /// Get a valid access token, refreshing it if needed
    ///
    /// # Errors
    /// Returns the grant error when the cache is stale and the identity
    /// provider request fails
    pub async fn get_token(&self) -> Result<String, TokenGrantError> {
        if let Some(token) = self.cached_token().await {
            debug!("Using cached service token");
            return Ok(token);
        }

        match &self.refresh_guard {
            Some(guard) => {
                let _in_flight = guard.lock().await;
                // A caller ahead of us in the queue may already have refreshed
                if let Some(token) = self.cached_token().await {
                    debug!("Service token refreshed by concurrent caller");
                    return Ok(token);
                }
                self.refresh().await
            }
            None => self.refresh().await,
        }
    }

    /// Current token if one is cached and still valid. Never hits the network.
    pub async fn cached_token(&self) -> Option<String> {
        let now = self.clock.now();
        let slot = self.slot.read().await;
        slot.as_ref().filter(|token| token.is_valid_at(now)).map(|token| token.value().to_string())
    }

    /// Drop the cached token so the next [`get_token`](Self::get_token) grants
    /// a fresh one
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
        debug!("Service token invalidated");
    }

    /// Remaining lifetime of the cached token, `None` when empty or expired
    pub async fn time_until_expiry(&self) -> Option<Duration> {
        let now = self.clock.now();
        let slot = self.slot.read().await;
        slot.as_ref().filter(|token| token.is_valid_at(now)).map(|token| token.remaining_at(now))
    }

    /// Whether single-flight refresh is enabled
    #[must_use]
    pub fn coalesces_refreshes(&self) -> bool {
        self.refresh_guard.is_some()
    }

    async fn refresh(&self) -> Result<String, TokenGrantError> {
        let grant = match self.grant_client.request_token().await {
            Ok(grant) => grant,
            Err(e) => {
                error!(error = %e, "Failed to obtain service access token");
                return Err(e);
            }
        };

        let Some(token) =
            AccessToken::issued(grant.access_token, self.clock.now(), grant.expires_in)
        else {
            let e = TokenGrantError::ParseError(format!(
                "expires_in out of range: {}",
                grant.expires_in
            ));
            error!(error = %e, "Failed to obtain service access token");
            return Err(e);
        };
        let value = token.value().to_string();

        *self.slot.write().await = Some(token);

        info!(expires_in = grant.expires_in, "Service access token refreshed");

        Ok(value)
    }
}

/// Builder for [`TokenCache`]
pub struct TokenCacheBuilder<C: TokenGrantClient + 'static, K: Clock> {
    grant_client: C,
    clock: K,
    coalesce_refreshes: bool,
}

impl<C: TokenGrantClient + 'static, K: Clock> TokenCacheBuilder<C, K> {
    /// Use a custom clock (e.g. `MockClock` in tests)
    #[must_use]
    pub fn clock<K2: Clock>(self, clock: K2) -> TokenCacheBuilder<C, K2> {
        TokenCacheBuilder {
            grant_client: self.grant_client,
            clock,
            coalesce_refreshes: self.coalesce_refreshes,
        }
    }

    /// Queue concurrent refreshes behind a single in-flight grant
    #[must_use]
    pub fn coalesce_refreshes(mut self, enabled: bool) -> Self {
        self.coalesce_refreshes = enabled;
        self
    }

    /// Build the cache with an empty slot
    #[must_use]
    pub fn build(self) -> TokenCache<C, K> {
        TokenCache {
            grant_client: Arc::new(self.grant_client),
            clock: self.clock,
            slot: RwLock::new(None),
            refresh_guard: self.coalesce_refreshes.then(|| Mutex::new(())),
        }
    }
}
