//! Configuration module for Pulse
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`PULSE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use pulse::config::PulseConfig;
//! use pulse::monitor::Strategy;
//!
//! // Load defaults
//! let config = PulseConfig::default();
//! assert_eq!(config.monitor.strategy, Strategy::Stream);
//!
//! // Parse from TOML
//! let toml = r#"
//! [monitor]
//! strategy = "poll"
//! "#;
//! let config: PulseConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.monitor.strategy, Strategy::Poll);
//! ```

pub mod display;
pub mod error;
pub mod logging;
pub mod services;

pub use display::DisplayConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig, COMPONENTS};
pub use services::{ServiceEndpoint, ServicesConfig};

// Re-export MonitorConfig from monitor module
pub use crate::monitor::{MonitorConfig, Strategy};

use crate::health::ServiceId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the Pulse monitor.
///
/// # Example
///
/// ```rust
/// use pulse::config::PulseConfig;
///
/// let config = PulseConfig::default();
/// assert_eq!(config.monitor.heartbeat_timeout_ms, 1000);
/// assert_eq!(config.monitor.retry_delay_ms, 3000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PulseConfig {
    /// Monitored service endpoints
    pub services: ServicesConfig,
    /// Strategy and timing of the connection manager
    pub monitor: MonitorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Terminal display settings
    pub display: DisplayConfig,
}

impl PulseConfig {
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
    /// Supports PULSE_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Service endpoints
        if let Ok(url) = std::env::var("PULSE_MASTER_URL") {
            self.services.master.url = url;
        }
        if let Ok(url) = std::env::var("PULSE_TENANT_URL") {
            self.services.tenant.url = url;
        }

        // Monitor settings
        if let Ok(strategy) = std::env::var("PULSE_STRATEGY") {
            if let Ok(s) = strategy.parse() {
                self.monitor.strategy = s;
            }
        }
        if let Ok(interval) = std::env::var("PULSE_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.monitor.poll_interval_ms = ms;
            }
        }

        // Logging settings
        if let Ok(level) = std::env::var("PULSE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PULSE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for service in ServiceId::ALL {
            let field = format!("services.{}.url", service.as_str());
            let url = self.services.root(service);
            if url.is_empty() {
                return Err(ConfigError::invalid(field, "URL cannot be empty"));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::invalid(
                    field,
                    "URL must start with http:// or https://",
                ));
            }
        }

        let timings = [
            ("monitor.heartbeat_timeout_ms", self.monitor.heartbeat_timeout_ms),
            ("monitor.retry_delay_ms", self.monitor.retry_delay_ms),
            ("monitor.poll_interval_ms", self.monitor.poll_interval_ms),
            (
                "monitor.request_timeout_seconds",
                self.monitor.request_timeout_seconds,
            ),
            ("display.refresh_ms", self.display.refresh_ms),
        ];
        for (field, value) in timings {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be non-zero"));
            }
        }

        if let Some(name) = self.logging.unknown_component() {
            return Err(ConfigError::invalid(
                format!("logging.component_levels.{}", name),
                format!("unknown component (expected one of: {})", COMPONENTS.join(", ")),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_pulse_config_defaults() {
        let config = PulseConfig::default();
        assert_eq!(config.monitor.strategy, Strategy::Stream);
        assert_eq!(config.monitor.heartbeat_timeout_ms, 1000);
        assert_eq!(config.monitor.retry_delay_ms, 3000);
        assert_eq!(config.monitor.poll_interval_ms, 1000);
        assert_eq!(config.display.refresh_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [services.master]
        url = "http://master.internal:9000"
        "#;

        let config: PulseConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.services.root(ServiceId::Master),
            "http://master.internal:9000"
        );
        assert_eq!(config.monitor.retry_delay_ms, 3000); // Default
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../pulse.example.toml");
        let config: PulseConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_unknown_strategy_fails() {
        let toml = r#"
        [monitor]
        strategy = "websocket"
        "#;
        assert!(toml::from_str::<PulseConfig>(toml).is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[monitor]\nstrategy = \"poll\"").unwrap();

        let config = PulseConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.monitor.strategy, Strategy::Poll);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[monitor\nstrategy = ").unwrap();

        let result = PulseConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = PulseConfig::load(Some(Path::new("/nonexistent/pulse.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = PulseConfig::load(None).unwrap();
        assert_eq!(config, PulseConfig::default());
    }

    #[test]
    fn test_config_env_override_urls() {
        std::env::set_var("PULSE_MASTER_URL", "http://m:1");
        std::env::set_var("PULSE_TENANT_URL", "http://t:2");
        let config = PulseConfig::default().with_env_overrides();
        std::env::remove_var("PULSE_MASTER_URL");
        std::env::remove_var("PULSE_TENANT_URL");

        assert_eq!(config.services.root(ServiceId::Master), "http://m:1");
        assert_eq!(config.services.root(ServiceId::Tenant), "http://t:2");
    }

    #[test]
    fn test_config_env_override_strategy() {
        std::env::set_var("PULSE_STRATEGY", "poll");
        let config = PulseConfig::default().with_env_overrides();
        std::env::remove_var("PULSE_STRATEGY");

        assert_eq!(config.monitor.strategy, Strategy::Poll);
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("PULSE_POLL_INTERVAL_MS", "soon");
        let config = PulseConfig::default().with_env_overrides();
        std::env::remove_var("PULSE_POLL_INTERVAL_MS");

        // Should keep default, not crash
        assert_eq!(config.monitor.poll_interval_ms, 1000);
    }

    #[test]
    fn test_config_env_override_log_settings() {
        std::env::set_var("PULSE_LOG_LEVEL", "debug");
        std::env::set_var("PULSE_LOG_FORMAT", "json");
        let config = PulseConfig::default().with_env_overrides();
        std::env::remove_var("PULSE_LOG_LEVEL");
        std::env::remove_var("PULSE_LOG_FORMAT");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_validation_empty_url() {
        let mut config = PulseConfig::default();
        config.services.tenant.url = String::new();

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "services.tenant.url"
        ));
    }

    #[test]
    fn test_config_validation_non_http_url() {
        let mut config = PulseConfig::default();
        config.services.master.url = "ftp://master".to_string();

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "services.master.url"
        ));
    }

    #[test]
    fn test_config_validation_zero_timing() {
        let mut config = PulseConfig::default();
        config.monitor.heartbeat_timeout_ms = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "monitor.heartbeat_timeout_ms"
        ));
    }

    #[test]
    fn test_config_validation_unknown_log_component() {
        let config: PulseConfig = toml::from_str(
            "[logging.component_levels]\nmonitor = \"debug\"\nsse = \"trace\"",
        )
        .unwrap();

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "logging.component_levels.sse"
        ));
    }
}
