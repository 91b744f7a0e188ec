//! # Configuration Structures
//!
//! This module defines the configuration structures for the repository
//! sidecar subsystems.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Are passed explicitly into component constructors, never read from
//!   ambient global state

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateUrl, ValidationError};

/// Unit multiplier for `annex_file_min_size_mb`.
pub const MEGABYTE: u64 = 1_000_000;

/// Main configuration structure.
///
/// ## Fields
/// - `search`: search service endpoints and the shared payload key
/// - `annex`: annex tool location, size filter and teardown modes
/// - `observability`: logging
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    /// Search service configuration
    #[serde(default)]
    #[validate(nested)]
    pub search: SearchConfig,

    /// Annex sidecar configuration
    #[serde(default)]
    #[validate(nested)]
    pub annex: AnnexConfig,

    /// Observability configuration
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

/// Search service configuration.
///
/// Indexing is disabled when `index_url` is unset or empty; that is a
/// normal operating state, not an error.
///
/// ## Fields
/// - `index_url`: endpoint receiving index requests (optional)
/// - `search_url`: endpoint answering search queries (optional)
/// - `key`: pre-shared payload key, 16 or 32 bytes
/// - `request_timeout_secs`: per-request timeout (default: 30)
/// - `max_in_flight`: optional cap on concurrent outbound dispatches
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_search"))]
pub struct SearchConfig {
    #[serde(default)]
    pub index_url: Option<String>,

    #[serde(default)]
    pub search_url: Option<String>,

    #[serde(default)]
    pub key: String,

    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_in_flight: Option<usize>
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_url: None,
            search_url: None,
            key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            max_in_flight: None
        }
    }
}

impl SearchConfig {
    /// The index endpoint, treating an empty string as unset.
    pub fn index_endpoint(&self) -> Option<&str> {
        self.index_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn search_endpoint(&self) -> Option<&str> {
        self.search_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("index_url", &self.index_url)
            .field("search_url", &self.search_url)
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Endpoints are checked only when set; an empty string means disabled.
fn validate_search(config: &SearchConfig) -> Result<(), ValidationError> {
    for endpoint in [config.index_endpoint(), config.search_endpoint()]
        .into_iter()
        .flatten()
    {
        if !endpoint.validate_url() {
            let mut err = ValidationError::new("url");
            err.message = Some(format!("invalid search endpoint: {endpoint}").into());
            return Err(err);
        }
    }

    let enabled = config.index_endpoint().is_some() || config.search_endpoint().is_some();
    if enabled && !matches!(config.key.len(), 16 | 32) {
        let mut err = ValidationError::new("key_length");
        err.message = Some("search key must be 16 or 32 bytes".into());
        return Err(err);
    }
    Ok(())
}

/// Annex sidecar configuration.
///
/// ## Fields
/// - `binary`: git executable the annex commands run through (default: "git")
/// - `annex_file_min_size_mb`: files below this size stay in git
///   (default: 10, multiplied by [`MEGABYTE`])
/// - `file_mode`: mode applied to regular files when teardown has to
///   remediate permissions (default: 0o660)
/// - `dir_mode`: mode applied to directories during remediation
///   (default: 0o770)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AnnexConfig {
    #[serde(default = "default_binary")]
    #[validate(length(min = 1))]
    pub binary: String,

    #[serde(default = "default_annex_file_min_size_mb")]
    pub annex_file_min_size_mb: u64,

    #[serde(default = "default_file_mode")]
    #[validate(range(max = 0o7777))]
    pub file_mode: u32,

    #[serde(default = "default_dir_mode")]
    #[validate(range(max = 0o7777))]
    pub dir_mode: u32
}

impl Default for AnnexConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            annex_file_min_size_mb: default_annex_file_min_size_mb(),
            file_mode: default_file_mode(),
            dir_mode: default_dir_mode()
        }
    }
}

impl AnnexConfig {
    /// Size threshold in bytes for the `annex.largefiles` filter.
    pub fn min_size_bytes(&self) -> u64 {
        self.annex_file_min_size_mb.saturating_mul(MEGABYTE)
    }
}

fn default_binary() -> String {
    "git".to_string()
}

fn default_annex_file_min_size_mb() -> u64 {
    10
}

fn default_file_mode() -> u32 {
    0o660
}

fn default_dir_mode() -> u32 {
    0o770
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    /// Logging level, used when `RUST_LOG` is not set
    #[serde(default = "default_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_level: default_logging_level()
        }
    }
}

fn default_logging_level() -> String {
    "info".to_string()
}

fn validate_logging_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("logging_level"))
    }
}
