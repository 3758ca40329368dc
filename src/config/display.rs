//! Terminal display configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the `watch` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Milliseconds between redraws of the status table
    pub refresh_ms: u64,
    /// Use colored output when the terminal supports it
    pub color: bool,
}

impl DisplayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 500,
            color: true,
        }
    }
}
