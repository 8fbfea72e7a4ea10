//! Test doubles for the API client's collaborators
//!
//! - [`MockAuthContext`]: scripted [`AuthContext`] with refresh accounting
//! - [`RecordingRedirect`]: [`LoginRedirect`] that counts invocations

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{ApiError, AuthContext, LoginRedirect};

#[derive(Debug, Default)]
struct AuthState {
    current: Option<String>,
    refreshed: Option<String>,
    refresh_error: Option<String>,
}

/// Mock auth context
///
/// Hands out `current` until [`fetch_token`](AuthContext::fetch_token) is
/// called, then switches to the token configured with
/// [`refreshes_to`](Self::refreshes_to).
#[derive(Debug, Default)]
pub struct MockAuthContext {
    state: Mutex<AuthState>,
    refreshes: AtomicUsize,
}

impl MockAuthContext {
    /// Context holding `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        let context = Self::default();
        context.state.lock().current = Some(token.into());
        context
    }

    /// Context for a signed-out user
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Token handed out after a successful refresh
    #[must_use]
    pub fn refreshes_to(self, token: impl Into<String>) -> Self {
        self.state.lock().refreshed = Some(token.into());
        self
    }

    /// Make every refresh fail with `ApiError::Auth(message)`
    #[must_use]
    pub fn failing_refresh(self, message: impl Into<String>) -> Self {
        self.state.lock().refresh_error = Some(message.into());
        self
    }

    /// Number of refreshes requested so far
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Token currently handed out
    pub fn current_token(&self) -> Option<String> {
        self.state.lock().current.clone()
    }
}

#[async_trait]
impl AuthContext for MockAuthContext {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.current_token())
    }

    async fn fetch_token(&self) -> Result<(), ApiError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock();
        if let Some(message) = &state.refresh_error {
            return Err(ApiError::Auth(message.clone()));
        }
        if let Some(next) = state.refreshed.take() {
            state.current = Some(next);
        }
        Ok(())
    }
}

/// Login redirect that records how often it fired
#[derive(Debug, Default)]
pub struct RecordingRedirect {
    redirects: AtomicUsize,
}

impl RecordingRedirect {
    /// Redirect with a zero count
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of redirects so far
    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    /// Whether any redirect fired
    pub fn was_redirected(&self) -> bool {
        self.redirect_count() > 0
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_auth_switches_token_on_refresh() {
        let auth = MockAuthContext::with_token("old").refreshes_to("new");

        assert_eq!(auth.token().await.unwrap().as_deref(), Some("old"));
        auth.fetch_token().await.unwrap();
        assert_eq!(auth.token().await.unwrap().as_deref(), Some("new"));
        assert_eq!(auth.refresh_count(), 1);
    }

    #[tokio::test]
    async fn mock_auth_failing_refresh_keeps_token() {
        let auth = MockAuthContext::with_token("old").failing_refresh("session expired");

        assert!(matches!(auth.fetch_token().await, Err(ApiError::Auth(_))));
        assert_eq!(auth.token().await.unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn recording_redirect_counts() {
        let redirect = RecordingRedirect::new();
        assert!(!redirect.was_redirected());

        redirect.redirect_to_login();
        redirect.redirect_to_login();
        assert_eq!(redirect.redirect_count(), 2);
    }
}
