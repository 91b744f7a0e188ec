//! # Configuration System
//!
//! Centralized configuration for the search-indexing and annex subsystems.
//!
//! This crate provides:
//! - Configuration structures for every component
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{AnnexConfig, Config, MEGABYTE, ObservabilityConfig, SearchConfig};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::{EnvError, apply_env_overrides, load_from_env};
pub use precedence::{ConfigError, load_layered};
pub use validation::validate;
