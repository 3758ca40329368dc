//! Check command implementation

use crate::cli::output::{format_status_json, format_status_table, service_views};
use crate::cli::CheckArgs;
use crate::config::PulseConfig;
use crate::logging::init_tracing;
use crate::monitor::{HttpHealthSource, Poller, ProbeResult};
use crate::status::StatusStore;
use std::fmt::Write;
use std::sync::Arc;

/// Result of a one-shot probe of every service.
#[derive(Debug)]
pub struct CheckReport {
    /// Rendered table or JSON document
    pub output: String,
    /// Whether every service answered with a valid snapshot
    pub all_online: bool,
}

/// Probe every configured service once and render the outcome.
pub async fn check_services(
    config: &PulseConfig,
    json: bool,
) -> Result<CheckReport, Box<dyn std::error::Error>> {
    let source = HttpHealthSource::new(&config.services, config.monitor.request_timeout_seconds)?;
    let store = Arc::new(StatusStore::new());
    let poller = Poller::new(
        Arc::new(source),
        Arc::clone(&store),
        config.monitor.poll_interval(),
    );

    let results = poller.poll_all().await;
    let all_online = results.iter().all(|(_, result)| result.is_success());
    let views = service_views(&store.snapshot());

    let output = if json {
        format_status_json(&views)?
    } else {
        let mut output = format_status_table(&views);
        for (service, result) in &results {
            if let ProbeResult::Failure { error } = result {
                write!(output, "\n✗ {}: {}", service.display_name(), error)?;
            }
        }
        output
    };

    Ok(CheckReport { output, all_online })
}

/// Handle `pulse check` command
pub async fn run_check(args: &CheckArgs) -> Result<CheckReport, Box<dyn std::error::Error>> {
    let config = args.connection.load_config()?;
    config.validate()?;
    init_tracing(&config.logging)?;

    check_services(&config, args.json).await
}
