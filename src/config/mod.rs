//! Configuration module for the TPOps console
//!
//! Provides layered configuration loading from files, environment variables,
//! and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`TPOPS_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use tpops::config::ConsoleConfig;
//!
//! // Load defaults
//! let config = ConsoleConfig::default();
//! assert_eq!(config.refresh.interval_seconds, 30);
//!
//! // Parse from TOML
//! let toml = r#"
//! [server]
//! base_url = "http://tpops.internal:9000"
//! "#;
//! let config: ConsoleConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.base_url, "http://tpops.internal:9000");
//! ```

pub mod error;
pub mod logging;
pub mod refresh;
pub mod search;
pub mod server;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use refresh::RefreshConfig;
pub use search::SearchConfig;
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the TPOps console.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backend endpoint configuration
    pub server: ServerConfig,
    /// Background refresh configuration
    pub refresh: RefreshConfig,
    /// Debounced search configuration
    pub search: SearchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports TPOPS_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("TPOPS_SERVER_URL") {
            self.server.base_url = url;
        }
        if let Ok(timeout) = std::env::var("TPOPS_TIMEOUT_SECONDS") {
            if let Ok(t) = timeout.parse() {
                self.server.timeout_seconds = t;
            }
        }
        if let Ok(interval) = std::env::var("TPOPS_REFRESH_INTERVAL") {
            if let Ok(i) = interval.parse() {
                self.refresh.interval_seconds = i;
            }
        }
        if let Ok(level) = std::env::var("TPOPS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TPOPS_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.is_empty() {
            return Err(ConfigError::Validation {
                field: "server.base_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.refresh.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "refresh.interval_seconds".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults_when_no_path() {
        let config = ConsoleConfig::load(None).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.search.debounce_ms, 300);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let result = ConsoleConfig::load(Some(Path::new("/nonexistent/tpops.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            [refresh]
            interval_seconds = 60
        "#;
        let config: ConsoleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.refresh.interval_seconds, 60);
        assert_eq!(config.server.timeout_seconds, 10); // default
        assert_eq!(config.search.debounce_ms, 300); // default
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut config = ConsoleConfig::default();
        config.server.base_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = ConsoleConfig::default();
        config.refresh.interval_seconds = 0;
        assert!(config.validate().is_err());
    }
}
