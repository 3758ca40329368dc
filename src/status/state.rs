//! Per-service status state.

use super::history::LatencyHistory;
use crate::health::HealthSnapshot;
use serde::{Serialize, Serializer};
use std::fmt;

/// Last observed latency of a service.
///
/// `Unbounded` stands for an infinite latency: the service is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Latency {
    Millis(u64),
    #[default]
    Unbounded,
}

impl Latency {
    pub fn millis(self) -> Option<u64> {
        match self {
            Latency::Millis(ms) => Some(ms),
            Latency::Unbounded => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Latency::Millis(ms) => ms as f64,
            Latency::Unbounded => f64::INFINITY,
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, Latency::Unbounded)
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Millis(ms) => write!(f, "{}ms", ms),
            Latency::Unbounded => f.write_str("∞"),
        }
    }
}

/// Serialized as a number, or `null` when unbounded.
impl Serialize for Latency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Latency::Millis(ms) => serializer.serialize_some(ms),
            Latency::Unbounded => serializer.serialize_none(),
        }
    }
}

/// Status of one monitored service as shown on the dashboard.
///
/// Values are immutable; each transition builds a new state. `connected` is
/// false exactly when `latency` is [`Latency::Unbounded`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ServiceStatusState {
    connected: bool,
    last_snapshot: Option<HealthSnapshot>,
    #[serde(rename = "latency_ms")]
    latency: Latency,
    latency_history: LatencyHistory,
}

impl ServiceStatusState {
    /// Disconnected, no data, empty history.
    pub fn initial() -> Self {
        Self::default()
    }

    /// State after a successful sample.
    pub fn with_live(&self, snapshot: HealthSnapshot, latency_ms: u64) -> Self {
        Self {
            connected: true,
            last_snapshot: Some(snapshot),
            latency: Latency::Millis(latency_ms),
            latency_history: self.latency_history.pushed(latency_ms),
        }
    }

    /// State after a failure. The last snapshot and history stay visible.
    pub fn with_down(&self) -> Self {
        Self {
            connected: false,
            last_snapshot: self.last_snapshot.clone(),
            latency: Latency::Unbounded,
            latency_history: self.latency_history.clone(),
        }
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn last_snapshot(&self) -> Option<&HealthSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn latency(&self) -> Latency {
        self.latency
    }

    pub fn latency_history(&self) -> &LatencyHistory {
        &self.latency_history
    }

    /// Offline as rendered: unreachable or never reached.
    pub fn is_offline(&self) -> bool {
        !self.connected || self.latency.is_unbounded()
    }
}
