//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{OAuthError, TokenGrantClient, TokenGrantError, TokenGrantResponse};

/// Scripted outcome for one grant request
#[derive(Debug, Clone)]
enum GrantOutcome {
    Issue(TokenGrantResponse),
    Reject(String),
}

/// Mock identity provider for [`TokenCache`](crate::auth::TokenCache) tests
///
/// Scripted outcomes are consumed in order. Once the script is exhausted every
/// call issues `mock-token-{n}` with a one hour lifetime. Clones share the
/// same script and call counter.
///
/// # Examples
///
/// ```
/// use querydesk_common::auth::{TokenGrantClient, TokenGrantResponse};
/// use querydesk_common::testing::MockTokenGrantClient;
///
/// # tokio_test::block_on(async {
/// let grants = MockTokenGrantClient::new();
/// grants.push_response(TokenGrantResponse::bearer("abc", 60));
///
/// assert_eq!(grants.request_token().await.unwrap().access_token, "abc");
/// assert_eq!(grants.request_token().await.unwrap().access_token, "mock-token-2");
/// assert_eq!(grants.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTokenGrantClient {
    script: Arc<Mutex<VecDeque<GrantOutcome>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockTokenGrantClient {
    /// Create a mock with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every grant, to open race windows in tests
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful grant
    pub fn push_response(&self, response: TokenGrantResponse) {
        // SAFETY: Mutex poisoning is acceptable in test mocks
        self.script.lock().unwrap().push_back(GrantOutcome::Issue(response));
    }

    /// Queue a rejected grant; surfaces as a 401 OAuth error with `error` code
    pub fn push_failure(&self, error: &str) {
        // SAFETY: Mutex poisoning is acceptable in test mocks
        self.script.lock().unwrap().push_back(GrantOutcome::Reject(error.to_string()));
    }

    /// Number of grant requests made so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenGrantClient for MockTokenGrantClient {
    async fn request_token(&self) -> Result<TokenGrantResponse, TokenGrantError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        // SAFETY: Mutex poisoning is acceptable in test mocks
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(GrantOutcome::Issue(response)) => Ok(response),
            Some(GrantOutcome::Reject(error)) => Err(TokenGrantError::OAuthError {
                status: 401,
                error: OAuthError { error, error_description: None },
            }),
            None => Ok(TokenGrantResponse::bearer(format!("mock-token-{call}"), 3600)),
        }
    }
}
