//! Example: Calling the QueryDesk backend as a service
//!
//! Loads configuration, initializes logging, and issues one authenticated
//! request using a client-credentials token from the identity provider.
//!
//! # Setup
//!
//! 1. Set the backend and identity variables: ```bash export
//!    QUERYDESK_API_BASE_URL=http://localhost:8000 export
//!    QUERYDESK_AUTH_DOMAIN=querydesk.us.auth0.com export
//!    QUERYDESK_CLIENT_ID=... QUERYDESK_CLIENT_SECRET=... export
//!    QUERYDESK_AUDIENCE=https://api.querydesk.dev ```
//!
//! 2. Run this example: ```bash cargo run -p querydesk-infra --example
//!    service_client -- /installations ```

use std::sync::Arc;

use querydesk_common::auth::{ClientCredentials, ClientCredentialsClient, TokenCache};
use querydesk_infra::api::{ApiClient, CachedCredentialsContext, CallbackRedirect};
use querydesk_infra::config;
use querydesk_infra::observability::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load()?;
    init_logging(&config.logging)?;

    let Some(identity) = config.identity.as_ref() else {
        eprintln!("Identity provider settings are required for service calls");
        return Ok(());
    };

    let credentials = ClientCredentials::new(
        identity.token_url(),
        identity.client_id.clone(),
        identity.client_secret.clone(),
        identity.audience.clone(),
    );
    let cache =
        Arc::new(TokenCache::builder(ClientCredentialsClient::new(credentials)?)
            .coalesce_refreshes(true)
            .build());

    let redirect = CallbackRedirect::new(config.backend.login_route.clone(), |route: &str| {
        eprintln!("Service credentials rejected; a user would be sent to {route}");
    });

    let client = ApiClient::new(
        config.backend.clone(),
        Arc::new(CachedCredentialsContext::new(cache)),
        Arc::new(redirect),
    )?;

    let path = std::env::args().nth(1).unwrap_or_else(|| "/health".to_string());
    println!("GET {}", client.url_for(&path));

    match client.get::<serde_json::Value>(&path).await {
        Ok(Some(body)) => println!("{}", serde_json::to_string_pretty(&body)?),
        Ok(None) => println!("No token available; request skipped"),
        Err(e) => {
            let triad = e.error_response();
            println!("✗ {} ({}) trace={}", triad.message, triad.error_code, triad.trace_id);
        }
    }

    Ok(())
}
