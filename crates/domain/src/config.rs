//! Configuration structures
//!
//! Loaded by `querydesk-infra`'s config loader from the environment or from a
//! TOML/JSON file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LOGIN_ROUTE, DEFAULT_LOG_FILTER};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    /// Client-credentials settings; absent for browser-only deployments
    #[serde(default)]
    pub identity: Option<IdentityProviderConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://api.querydesk.dev/v1`
    pub base_url: String,
    /// Route the user is sent to when authentication cannot be recovered
    #[serde(default = "default_login_route")]
    pub login_route: String,
    /// Request timeout in seconds; `None` leaves the transport default
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl BackendConfig {
    /// Backend settings with defaults for everything but the base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login_route: default_login_route(),
            timeout_seconds: None,
            user_agent: None,
        }
    }

    /// Join `path` onto the base URL without doubling the separator
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Identity provider settings for the client-credentials grant
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    /// Authorization server domain, e.g. `querydesk.us.auth0.com`
    pub domain: String,
    pub client_id: String,
    pub client_secret: String,
    /// API identifier the token is issued for
    pub audience: String,
}

impl IdentityProviderConfig {
    /// Token endpoint: `https://{domain}/oauth/token`.
    ///
    /// A domain that already carries a scheme is used as-is, which lets tests
    /// point the grant at a local mock server.
    #[must_use]
    pub fn token_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{domain}/oauth/token")
        } else {
            format!("https://{domain}/oauth/token")
        }
    }
}

impl fmt::Debug for IdentityProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityProviderConfig")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("audience", &self.audience)
            .finish()
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: false }
    }
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_handles_slashes() {
        let backend = BackendConfig::new("https://api.example.com/v1/");

        assert_eq!(backend.url_for("/queries"), "https://api.example.com/v1/queries");
        assert_eq!(backend.url_for("queries"), "https://api.example.com/v1/queries");
        assert_eq!(backend.url_for(""), "https://api.example.com/v1");
    }

    #[test]
    fn token_url_adds_scheme_when_missing() {
        let identity = IdentityProviderConfig {
            domain: "tenant.auth0.com".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            audience: "https://api".to_string(),
        };
        assert_eq!(identity.token_url(), "https://tenant.auth0.com/oauth/token");

        let local = IdentityProviderConfig { domain: "http://127.0.0.1:9000".to_string(), ..identity };
        assert_eq!(local.token_url(), "http://127.0.0.1:9000/oauth/token");
    }

    #[test]
    fn debug_redacts_client_secret() {
        let identity = IdentityProviderConfig {
            domain: "tenant.auth0.com".to_string(),
            client_id: "id".to_string(),
            client_secret: "super-secret".to_string(),
            audience: "https://api".to_string(),
        };

        let debug = format!("{identity:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn config_defaults_apply_when_sections_missing() {
        let config: Config =
            serde_json::from_str(r#"{"backend":{"base_url":"https://api.example.com"}}"#).unwrap();

        assert_eq!(config.backend.login_route, "/login");
        assert_eq!(config.backend.timeout_seconds, None);
        assert!(config.identity.is_none());
        assert_eq!(config.logging, LoggingConfig::default());
    }
}
