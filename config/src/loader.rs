//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! - `GIN_SEARCH_*`: search service settings
//! - `GIN_ANNEX_*`: annex sidecar settings
//! - `GIN_LOG_LEVEL`: logging level

use crate::config::Config;
use std::env;

/// An environment variable was set to a value that does not parse.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value {value:?} for {key}: {reason}")]
pub struct EnvError {
    pub key: String,
    pub value: String,
    pub reason: String
}

/// Load configuration from environment variables on top of the defaults.
///
/// ## Environment Variables
/// ### Search Settings (`GIN_SEARCH_*`)
/// - `GIN_SEARCH_INDEX_URL`: index endpoint (unset or empty disables indexing)
/// - `GIN_SEARCH_URL`: search query endpoint
/// - `GIN_SEARCH_KEY`: pre-shared payload key
/// - `GIN_SEARCH_TIMEOUT_SECONDS`: request timeout (default: 30)
/// - `GIN_SEARCH_MAX_IN_FLIGHT`: cap on concurrent dispatches (default: none)
///
/// ### Annex Settings (`GIN_ANNEX_*`)
/// - `GIN_ANNEX_BINARY`: git executable (default: "git")
/// - `GIN_ANNEX_MIN_SIZE_MB`: annex size filter in megabytes (default: 10)
///
/// ### Observability
/// - `GIN_LOG_LEVEL`: trace/debug/info/warn/error (default: "info")
pub fn load_from_env() -> Result<Config, EnvError> {
    apply_env_overrides(Config::default())
}

/// Override fields of `base` for every variable that is set.
pub fn apply_env_overrides(mut config: Config) -> Result<Config, EnvError> {
    if let Ok(url) = env::var("GIN_SEARCH_INDEX_URL") {
        config.search.index_url = Some(url);
    }
    if let Ok(url) = env::var("GIN_SEARCH_URL") {
        config.search.search_url = Some(url);
    }
    if let Ok(key) = env::var("GIN_SEARCH_KEY") {
        config.search.key = key;
    }
    if let Some(timeout) = parse_env("GIN_SEARCH_TIMEOUT_SECONDS")? {
        config.search.request_timeout_secs = timeout;
    }
    if let Some(max) = parse_env("GIN_SEARCH_MAX_IN_FLIGHT")? {
        config.search.max_in_flight = Some(max);
    }

    if let Ok(binary) = env::var("GIN_ANNEX_BINARY") {
        config.annex.binary = binary;
    }
    if let Some(size) = parse_env("GIN_ANNEX_MIN_SIZE_MB")? {
        config.annex.annex_file_min_size_mb = size;
    }

    if let Ok(level) = env::var("GIN_LOG_LEVEL") {
        config.observability.logging_level = level;
    }

    Ok(config)
}

fn parse_env<T>(key: &str) -> Result<Option<T>, EnvError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display
{
    match env::var(key) {
        Ok(s) => s.parse::<T>().map(Some).map_err(|e| EnvError {
            key: key.to_string(),
            value: s.clone(),
            reason: e.to_string()
        }),
        Err(_) => Ok(None)
    }
}
