//! Health snapshot model for the monitored services.
//!
//! This module defines the wire contract produced by the master and tenant
//! services: each report carries the service's own health plus the health of
//! the services it is connected to. Payloads are validated at the network
//! boundary; a report missing either half is a transport error, never a
//! silently defaulted value.

mod error;
pub mod parser;

#[cfg(test)]
mod tests;

pub use error::*;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the two monitored services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    Master,
    Tenant,
}

impl ServiceId {
    /// Every monitored service, in display order.
    pub const ALL: [ServiceId; 2] = [ServiceId::Master, ServiceId::Tenant];

    /// The service this one depends on.
    ///
    /// The pairing is fixed and never reflexive: master reports on the tenant
    /// service and tenant reports on the master service.
    pub fn target(self) -> ServiceId {
        match self {
            ServiceId::Master => ServiceId::Tenant,
            ServiceId::Tenant => ServiceId::Master,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceId::Master => "master",
            ServiceId::Tenant => "tenant",
        }
    }

    /// Human-readable label used in dependency indicators ("Tenant Service").
    pub fn display_name(self) -> &'static str {
        match self {
            ServiceId::Master => "Master Service",
            ServiceId::Tenant => "Tenant Service",
        }
    }

    /// Map a `servicesConnected` key to a service.
    ///
    /// Producers key dependencies by backing-service name (`tenantService`);
    /// the bare service name is accepted as well. Unknown keys yield `None`.
    pub fn from_wire_key(key: &str) -> Option<ServiceId> {
        match key {
            "masterService" | "master" => Some(ServiceId::Master),
            "tenantService" | "tenant" => Some(ServiceId::Tenant),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "master" => Ok(ServiceId::Master),
            "tenant" => Ok(ServiceId::Tenant),
            _ => Err(format!("Unknown service: {}", s)),
        }
    }
}

/// Reported health of a single server.
///
/// There is no `Down` value: consumers treat a service as down when it is
/// unreachable, not when it says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    #[serde(rename = "UP")]
    Up,
    #[default]
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

/// Health block of one server as seen by its producer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerHealth {
    #[serde(default, deserialize_with = "nullable_status")]
    pub status: HealthStatus,
    /// Process uptime in seconds
    #[serde(default, rename = "uptime", alias = "uptimeSeconds")]
    pub uptime_seconds: Option<f64>,
    /// When the producer observed this health value
    #[serde(
        default,
        rename = "timestamp",
        alias = "observedAtEpochMs",
        deserialize_with = "flexible_timestamp"
    )]
    pub observed_at: Option<DateTime<Utc>>,
    /// Producer clock (epoch ms) at send time; used for stream latency
    #[serde(default, rename = "now", alias = "emittedAtEpochMs")]
    pub emitted_at_ms: Option<i64>,
}

impl ServerHealth {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Point-in-time health report from one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    #[serde(rename = "health", alias = "own")]
    pub own: ServerHealth,
    #[serde(
        rename = "servicesConnected",
        alias = "dependencies",
        deserialize_with = "known_dependencies"
    )]
    pub dependencies: BTreeMap<ServiceId, ServerHealth>,
}

impl HealthSnapshot {
    /// Health of the dependency `service` is paired with, if reported.
    pub fn target_health(&self, service: ServiceId) -> Option<&ServerHealth> {
        self.dependencies.get(&service.target())
    }

    /// Whether the paired dependency reported itself `UP`.
    pub fn is_target_up(&self, service: ServiceId) -> bool {
        self.target_health(service).is_some_and(ServerHealth::is_up)
    }
}

fn nullable_status<'de, D>(deserializer: D) -> Result<HealthStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HealthStatus>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Accepts RFC 3339 strings or epoch milliseconds. Unparseable text is
/// treated as absent since the value is informational only.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(ms).single(),
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    }))
}

fn known_dependencies<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<ServiceId, ServerHealth>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, ServerHealth>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, health)| ServiceId::from_wire_key(&key).map(|id| (id, health)))
        .collect())
}
