//! # Configuration Precedence
//!
//! # Precedence Order
//! 1. Environment variables (highest priority)
//! 2. Configuration file
//! 3. Default values (lowest priority)

use crate::config::Config;
use crate::file_loader::{ConfigFileError, load_from_file};
use crate::loader::{EnvError, apply_env_overrides};
use std::path::Path;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    File(#[from] ConfigFileError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors)
}

/// Build the effective configuration and validate it.
///
/// The file, when given, replaces the defaults; environment variables then
/// override individual fields.
pub fn load_layered(file: Option<&Path>) -> Result<Config, ConfigError> {
    let base = match file {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration file");
            load_from_file(path)?
        }
        None => Config::default()
    };

    let config = apply_env_overrides(base)?;
    config.validate()?;
    Ok(config)
}
