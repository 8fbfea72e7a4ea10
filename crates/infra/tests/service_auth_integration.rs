//! End-to-end service authentication
//!
//! Identity provider and backend are both wiremock servers. The API client
//! authenticates through `CachedCredentialsContext` over a real
//! `ClientCredentialsClient`.

use std::sync::Arc;

use querydesk_common::auth::{ClientCredentials, ClientCredentialsClient, TokenCache};
use querydesk_domain::{BackendConfig, IdentityProviderConfig};
use querydesk_infra::api::{ApiClient, ApiError, CachedCredentialsContext};
use querydesk_infra::testing::RecordingRedirect;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn identity_for(idp: &MockServer) -> IdentityProviderConfig {
    IdentityProviderConfig {
        domain: idp.uri(),
        client_id: "bot-client".into(),
        client_secret: "bot-secret".into(),
        audience: "https://api.querydesk.dev".into(),
    }
}

fn token_cache_for(
    identity: &IdentityProviderConfig,
) -> Arc<TokenCache<ClientCredentialsClient>> {
    let credentials = ClientCredentials::new(
        identity.token_url(),
        identity.client_id.clone(),
        identity.client_secret.clone(),
        identity.audience.clone(),
    );
    Arc::new(TokenCache::new(ClientCredentialsClient::new(credentials).unwrap()))
}

async fn mount_grant(idp: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({ "grant_type": "client_credentials" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": token, "expires_in": 86400 })),
        )
        .up_to_n_times(times)
        .expect(times)
        .mount(idp)
        .await;
}

/// Validates that repeated calls share one cached service token.
///
/// Assertions:
/// - Confirms the identity provider is hit once for three API calls.
/// - Confirms every API call carries the granted token.
#[tokio::test]
async fn test_service_token_is_granted_once_and_reused() {
    let idp = MockServer::start().await;
    let backend = MockServer::start().await;

    mount_grant(&idp, "svc-1", 1).await;
    Mock::given(method("GET"))
        .and(path("/installations/T123"))
        .and(header("authorization", "Bearer svc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "team": "T123" })))
        .expect(3)
        .mount(&backend)
        .await;

    let cache = token_cache_for(&identity_for(&idp));
    let client = ApiClient::new(
        BackendConfig::new(backend.uri()),
        Arc::new(CachedCredentialsContext::new(cache.clone())),
        Arc::new(RecordingRedirect::new()),
    )
    .unwrap();

    for _ in 0..3 {
        let body: Option<serde_json::Value> = client.get("/installations/T123").await.unwrap();
        assert_eq!(body, Some(json!({ "team": "T123" })));
    }

    assert!(cache.time_until_expiry().await.is_some());
}

/// Validates recovery when the backend rejects a cached service token.
///
/// Assertions:
/// - Confirms a second grant is requested after the 401.
/// - Confirms the retried call succeeds with the new token and no redirect
///   fires.
#[tokio::test]
async fn test_rejected_service_token_is_regranted_and_retried() {
    let idp = MockServer::start().await;
    let backend = MockServer::start().await;

    mount_grant(&idp, "revoked", 1).await;
    mount_grant(&idp, "fresh", 1).await;

    Mock::given(method("POST"))
        .and(path("/queries"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/queries"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sql": "SELECT 1" })))
        .expect(1)
        .mount(&backend)
        .await;

    let redirect = Arc::new(RecordingRedirect::new());
    let client = ApiClient::new(
        BackendConfig::new(backend.uri()),
        Arc::new(CachedCredentialsContext::new(token_cache_for(&identity_for(&idp)))),
        redirect.clone(),
    )
    .unwrap();

    let body: Option<serde_json::Value> =
        client.post("/queries", &json!({ "question": "how many users?" })).await.unwrap();

    assert_eq!(body, Some(json!({ "sql": "SELECT 1" })));
    assert!(!redirect.was_redirected());
}

#[tokio::test]
async fn test_identity_outage_surfaces_as_refresh_failure() {
    let idp = MockServer::start().await;
    let backend = MockServer::start().await;

    mount_grant(&idp, "revoked", 1).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&idp)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend)
        .await;

    let redirect = Arc::new(RecordingRedirect::new());
    let client = ApiClient::new(
        BackendConfig::new(backend.uri()),
        Arc::new(CachedCredentialsContext::new(token_cache_for(&identity_for(&idp)))),
        redirect.clone(),
    )
    .unwrap();

    let result = client.get::<serde_json::Value>("/queries").await;

    assert!(matches!(result, Err(ApiError::RefreshFailed(_))));
    assert_eq!(redirect.redirect_count(), 1);
}

/// Validates that a rejected client-credentials grant fails the API call.
///
/// Assertions:
/// - Confirms `get()` returns `ApiError::Auth` rather than an empty success.
/// - Confirms the backend is never contacted.
#[tokio::test]
async fn test_rejected_grant_fails_the_call() {
    let idp = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "access_denied",
            "error_description": "Unauthorized",
        })))
        .expect(1)
        .mount(&idp)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let redirect = Arc::new(RecordingRedirect::new());
    let client = ApiClient::new(
        BackendConfig::new(backend.uri()),
        Arc::new(CachedCredentialsContext::new(token_cache_for(&identity_for(&idp)))),
        redirect.clone(),
    )
    .unwrap();

    let err = client.get::<serde_json::Value>("/installations/T123").await.unwrap_err();

    assert!(matches!(err, ApiError::Auth(ref msg) if msg.contains("access_denied")));
    assert!(!redirect.was_redirected());
}
