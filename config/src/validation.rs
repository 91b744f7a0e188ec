//! # Configuration Validation
//!
//! ## Validation Rules
//! ### Search
//! - `index_url`, `search_url`: must parse as URLs when present and non-empty
//! - `key`: 16 or 32 bytes whenever an endpoint is configured
//! - `request_timeout_secs`: 1-300
//! - `max_in_flight`: at least 1 when present
//!
//! ### Annex
//! - `binary`: non-empty
//! - `file_mode`, `dir_mode`: at most 0o7777
//!
//! ### Observability
//! - `logging_level`: must be "trace", "debug", "info", "warn", or "error"

use crate::config::Config;
use validator::Validate;

pub fn validate(config: &Config) -> Result<(), validator::ValidationErrors> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> Config {
        let mut config = Config::default();
        config.search.index_url = Some("http://dex:10443/index".to_string());
        config.search.key = "0123456789abcdef".to_string();
        config
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate(&Config::default()).is_ok());
        assert!(validate(&enabled()).is_ok());
    }

    #[test]
    fn test_validate_key_required_when_enabled() {
        let mut config = enabled();
        config.search.key = String::new();
        assert!(validate(&config).is_err());

        config.search.key = "0123456789abcdef0123456789abcdef".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_key_ignored_when_disabled() {
        let mut config = Config::default();
        config.search.key = "odd".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_url() {
        let mut config = enabled();
        config.search.index_url = Some("not a url".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_empty_urls_mean_disabled() {
        let mut config = Config::default();
        config.search.index_url = Some(String::new());
        config.search.search_url = Some(String::new());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_timeout() {
        let mut config = Config::default();
        config.search.request_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_mode() {
        let mut config = Config::default();
        config.annex.dir_mode = 0o17777;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_logging_level() {
        let mut config = Config::default();
        config.observability.logging_level = "verbose".to_string();
        assert!(validate(&config).is_err());
    }
}
