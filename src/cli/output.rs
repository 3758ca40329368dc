//! Output formatting helpers for CLI commands

use crate::health::{HealthStatus, ServiceId};
use crate::status::{ServiceStatusState, StatusesMap};
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

/// View model for service display
#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    pub service: ServiceId,
    pub name: &'static str,
    pub connected: bool,
    /// Last latency in milliseconds, `None` while offline
    pub latency_ms: Option<u64>,
    pub latency_history: Vec<u64>,
    /// Uptime reported in the service's last snapshot
    pub uptime_seconds: Option<f64>,
    /// When the last snapshot was produced
    pub observed_at: Option<DateTime<Utc>>,
    /// The service's own view of its paired service
    pub dependency: DependencyView,
}

/// How a service sees the other monitored service.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyView {
    pub service: ServiceId,
    pub status: Option<HealthStatus>,
}

impl ServiceView {
    pub fn new(service: ServiceId, state: &ServiceStatusState) -> Self {
        let snapshot = state.last_snapshot();
        let target = service.target();

        Self {
            service,
            name: service.display_name(),
            connected: state.connected(),
            latency_ms: state.latency().millis(),
            latency_history: state.latency_history().to_vec(),
            uptime_seconds: snapshot.and_then(|s| s.own.uptime_seconds),
            observed_at: snapshot.and_then(|s| s.own.observed_at),
            dependency: DependencyView {
                service: target,
                status: snapshot
                    .and_then(|s| s.target_health(target))
                    .map(|health| health.status),
            },
        }
    }
}

/// Build views for every service in a statuses snapshot.
pub fn service_views(statuses: &StatusesMap) -> Vec<ServiceView> {
    statuses
        .iter()
        .map(|(service, state)| ServiceView::new(*service, state))
        .collect()
}

/// Format duration in a human-readable way
pub fn format_uptime(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Render a latency history as a compact list, oldest first.
pub fn format_history(samples: &[u64]) -> String {
    if samples.is_empty() {
        return "-".to_string();
    }
    samples
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Get status icon for a dependency as reported by its peer
pub fn dependency_icon(status: Option<HealthStatus>) -> &'static str {
    match status {
        Some(HealthStatus::Up) => "✓",
        Some(HealthStatus::Unknown) => "✗",
        None => "?",
    }
}

/// Format service statuses as a table
pub fn format_status_table(views: &[ServiceView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Service", "Status", "Latency", "History (ms)", "Uptime", "Sees",
    ]);

    for v in views {
        let (status, latency) = match v.latency_ms {
            Some(ms) if v.connected => ("Online".green().to_string(), format!("{}ms", ms)),
            _ => ("Offline".red().to_string(), "Offline".red().to_string()),
        };

        // An offline service's last snapshot is stale; show no peer view
        // or history for it.
        let (history, sees) = if v.connected {
            let icon = match v.dependency.status {
                Some(HealthStatus::Up) => dependency_icon(v.dependency.status).green(),
                Some(HealthStatus::Unknown) => dependency_icon(v.dependency.status).red(),
                None => dependency_icon(v.dependency.status).yellow(),
            };
            (
                format_history(&v.latency_history),
                format!("{} {}", icon, v.dependency.service.display_name()),
            )
        } else {
            ("-".to_string(), "-".to_string())
        };

        table.add_row(vec![
            Cell::new(v.name),
            Cell::new(status),
            Cell::new(latency),
            Cell::new(history),
            Cell::new(
                v.uptime_seconds
                    .map(format_uptime)
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(sees),
        ]);
    }

    table.to_string()
}

/// Format service statuses as JSON
pub fn format_status_json(views: &[ServiceView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "services": views
    }))
}
