//! Integration tests for the service token cache
//!
//! Drives `TokenCache` over a real `ClientCredentialsClient` against a
//! wiremock identity provider, with a `MockClock` controlling expiry.

use std::sync::Arc;
use std::time::Duration;

use querydesk_common::auth::{
    ClientCredentials, ClientCredentialsClient, TokenCache, TokenGrantError,
};
use querydesk_common::testing::MockClock;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn grant_client(server: &MockServer) -> ClientCredentialsClient {
    let credentials = ClientCredentials::new(
        format!("{}/oauth/token", server.uri()),
        "bot-client",
        "bot-secret",
        "https://api.querydesk.dev",
    );
    ClientCredentialsClient::new(credentials).expect("credentials are complete")
}

async fn mount_token(server: &MockServer, token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": token, "expires_in": expires_in })),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Validates the full token lifecycle over HTTP.
///
/// Assertions:
/// - Confirms the first token is served until its lifetime elapses.
/// - Confirms exactly one extra grant is made once it expires.
#[tokio::test]
async fn test_token_lifecycle_against_identity_provider() {
    let server = MockServer::start().await;
    mount_token(&server, "day-one", 86400).await;
    mount_token(&server, "day-two", 86400).await;

    let clock = MockClock::new();
    let cache = TokenCache::builder(grant_client(&server)).clock(clock.clone()).build();

    assert_eq!(cache.get_token().await.unwrap(), "day-one");

    clock.advance_secs(86399);
    assert_eq!(cache.get_token().await.unwrap(), "day-one");

    clock.advance_secs(1);
    assert_eq!(cache.get_token().await.unwrap(), "day-two");
    assert_eq!(cache.get_token().await.unwrap(), "day-two");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_invalid_client_is_reported_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "access_denied",
            "error_description": "Unauthorized",
        })))
        .mount(&server)
        .await;

    let cache = TokenCache::new(grant_client(&server));

    for _ in 0..2 {
        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, TokenGrantError::OAuthError { status: 401, .. }));
    }

    assert_eq!(cache.cached_token().await, None);
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2, "failures must not be cached");
}

/// Validates single-flight refresh under a burst of concurrent callers.
///
/// Assertions:
/// - Confirms every caller receives the same token.
/// - Confirms the identity provider saw a single grant request.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_coalesced_cache_shares_one_grant_across_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "shared", "expires_in": 3600 }))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let cache =
        Arc::new(TokenCache::builder(grant_client(&server)).coalesce_refreshes(true).build());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "shared");
    }

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
}
