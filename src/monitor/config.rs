//! Configuration for the connection manager.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How live status is obtained from each service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Server-sent event stream with a client-side heartbeat watchdog.
    /// Latency is the producer's send time subtracted from local receive time.
    #[default]
    Stream,
    /// Fixed-interval requests. Latency is the measured round trip.
    Poll,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stream" | "sse" => Ok(Strategy::Stream),
            "poll" => Ok(Strategy::Poll),
            _ => Err(format!("Invalid strategy: {}", s)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Stream => f.write_str("stream"),
            Strategy::Poll => f.write_str("poll"),
        }
    }
}

/// Timing and strategy settings for service monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Monitoring strategy
    pub strategy: Strategy,
    /// Silence on a stream longer than this marks the service down
    pub heartbeat_timeout_ms: u64,
    /// Fixed delay before reopening a failed stream
    pub retry_delay_ms: u64,
    /// Milliseconds between poll cycles
    pub poll_interval_ms: u64,
    /// Timeout for each poll request (and stream connect)
    pub request_timeout_seconds: u64,
}

impl MonitorConfig {
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Stream,
            heartbeat_timeout_ms: 1000,
            retry_delay_ms: 3000,
            poll_interval_ms: 1000,
            request_timeout_seconds: 5,
        }
    }
}
