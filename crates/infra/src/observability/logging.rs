//! Global `tracing` subscriber setup

use querydesk_domain::{LoggingConfig, QueryDeskError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. Output is JSON lines when
/// `config.json` is set and human-readable otherwise.
///
/// Returns `Ok(false)` if a global subscriber was already installed.
///
/// # Errors
/// Returns `QueryDeskError::Config` if the filter directive is invalid.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let filter = resolve_filter(std::env::var("RUST_LOG").ok(), &config.filter)?;

    let json_layer = config.json.then(|| fmt::layer().json().flatten_event(true));
    let text_layer = (!config.json).then(fmt::layer);

    let installed =
        tracing_subscriber::registry().with(filter).with(json_layer).with(text_layer).try_init();

    match installed {
        Ok(()) => {
            tracing::debug!(filter = %config.filter, json = config.json, "Logging initialized");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

/// Build the filter from `RUST_LOG` when set, else from the configured
/// directive
fn resolve_filter(from_env: Option<String>, fallback: &str) -> Result<EnvFilter> {
    let directive = from_env.filter(|value| !value.trim().is_empty());
    let directive = directive.as_deref().unwrap_or(fallback);

    EnvFilter::try_new(directive)
        .map_err(|e| QueryDeskError::Config(format!("Invalid log filter '{directive}': {e}")))
}
