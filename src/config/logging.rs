//! `[logging]` section
//!
//! `pulse watch` redraws the terminal, so logs default to `warn` and go to
//! stderr. Per-component levels are keyed by the crate's top-level modules
//! (see [`COMPONENTS`]) and become `pulse::<component>=<level>` directives.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Modules that accept a level under `[logging.component_levels]`.
pub const COMPONENTS: [&str; 5] = ["cli", "config", "health", "monitor", "status"];

/// How log lines are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per event, for piping into a collector
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {} (expected pretty or json)", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base filter level; `PULSE_LOG_LEVEL` and `--log-level` override it
    pub level: String,
    pub format: LogFormat,
    /// e.g. `{ monitor = "debug" }` to trace reconnects without the rest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
}

impl LoggingConfig {
    /// First configured component that is not one of [`COMPONENTS`], in
    /// name order.
    pub fn unknown_component(&self) -> Option<&str> {
        let levels = self.component_levels.as_ref()?;
        let mut unknown: Vec<&str> = levels
            .keys()
            .map(String::as_str)
            .filter(|name| !COMPONENTS.contains(name))
            .collect();
        unknown.sort_unstable();
        unknown.first().copied()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_stay_quiet() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.unknown_component().is_none());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.contains("expected pretty or json"));
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn test_component_levels_from_toml() {
        let config: LoggingConfig = toml::from_str(
            r#"
            [component_levels]
            monitor = "debug"
            status = "trace"
            "#,
        )
        .unwrap();
        assert_eq!(config.level, "warn");
        assert!(config.unknown_component().is_none());
        let levels = config.component_levels.unwrap();
        assert_eq!(levels.get("monitor").map(String::as_str), Some("debug"));
    }

    #[test]
    fn test_unknown_component_reported() {
        let mut levels = HashMap::new();
        levels.insert("monitor".to_string(), "debug".to_string());
        levels.insert("sse".to_string(), "trace".to_string());
        levels.insert("poller".to_string(), "trace".to_string());
        let config = LoggingConfig {
            component_levels: Some(levels),
            ..Default::default()
        };
        assert_eq!(config.unknown_component(), Some("poller"));
    }
}
