//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the process environment, if one exists
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `QUERYDESK_API_BASE_URL`: Backend base URL (required)
//! - `QUERYDESK_LOGIN_ROUTE`: Route used when the session cannot be recovered
//! - `QUERYDESK_HTTP_TIMEOUT`: Request timeout in seconds
//! - `QUERYDESK_USER_AGENT`: User agent sent to the backend
//! - `QUERYDESK_AUTH_DOMAIN`: Identity provider domain
//! - `QUERYDESK_CLIENT_ID`: Client-credentials client id
//! - `QUERYDESK_CLIENT_SECRET`: Client-credentials secret
//! - `QUERYDESK_AUDIENCE`: API identifier the service token is issued for
//! - `QUERYDESK_LOG_FILTER`: Default log filter when `RUST_LOG` is unset
//! - `QUERYDESK_LOG_JSON`: Emit JSON logs (true/false)
//!
//! The identity block is only populated when all four identity variables are
//! set.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./querydesk.{toml,json}` or `./config.{toml,json}` (current working
//!    directory)
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};

use querydesk_domain::constants::{DEFAULT_LOGIN_ROUTE, DEFAULT_LOG_FILTER};
use querydesk_domain::{
    BackendConfig, Config, IdentityProviderConfig, LoggingConfig, QueryDeskError, Result,
};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["querydesk.toml", "querydesk.json", "config.toml", "config.json"];

const IDENTITY_VARS: [&str; 4] = [
    "QUERYDESK_AUTH_DOMAIN",
    "QUERYDESK_CLIENT_ID",
    "QUERYDESK_CLIENT_SECRET",
    "QUERYDESK_AUDIENCE",
];

/// Load configuration with automatic fallback strategy
///
/// Reads `.env` first, then attempts to load from environment variables. If
/// any required variables are missing, falls back to loading from a config
/// file.
///
/// # Errors
/// Returns `QueryDeskError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    // Try loading from environment first
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            // Fall back to file
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `QUERYDESK_API_BASE_URL` is required; everything else has a default.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `QueryDeskError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("QUERYDESK_API_BASE_URL")?;
    let login_route =
        env_opt("QUERYDESK_LOGIN_ROUTE").unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string());
    let timeout_seconds = env_opt("QUERYDESK_HTTP_TIMEOUT")
        .map(|s| {
            s.parse::<u64>()
                .map_err(|e| QueryDeskError::Config(format!("Invalid HTTP timeout: {}", e)))
        })
        .transpose()?;
    let user_agent = env_opt("QUERYDESK_USER_AGENT");

    let logging = LoggingConfig {
        filter: env_opt("QUERYDESK_LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        json: env_bool("QUERYDESK_LOG_JSON", false),
    };

    Ok(Config {
        backend: BackendConfig { base_url, login_route, timeout_seconds, user_agent },
        identity: identity_from_env(),
        logging,
    })
}

/// Identity provider block, present only when every identity variable is set
fn identity_from_env() -> Option<IdentityProviderConfig> {
    let values: Vec<Option<String>> = IDENTITY_VARS.iter().map(|key| env_opt(key)).collect();

    match values.as_slice() {
        [Some(domain), Some(client_id), Some(client_secret), Some(audience)] => {
            Some(IdentityProviderConfig {
                domain: domain.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                audience: audience.clone(),
            })
        }
        partial => {
            if partial.iter().any(Option::is_some) {
                tracing::warn!(
                    "Incomplete identity provider settings in environment; service auth disabled"
                );
            }
            None
        }
    }
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `QueryDeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(QueryDeskError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            QueryDeskError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(InfraError::from)?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `QueryDeskError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| QueryDeskError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| QueryDeskError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(QueryDeskError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for `querydesk.{toml,json}` and `config.{toml,json}` in:
/// 1. Current working directory
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| [root.clone(), root.join(".."), root.join("../..")])
        .flat_map(|dir| CONFIG_FILE_NAMES.map(|name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `QueryDeskError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        QueryDeskError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; blank values count as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
