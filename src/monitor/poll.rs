//! Polling strategy driver.
//!
//! A single interval drives both services. On each tick every service that has
//! no request outstanding is probed; results are applied as they arrive. A
//! service whose request hangs only skips its own ticks, so the other keeps
//! its cadence.

use super::source::HealthSource;
use crate::health::{HealthSnapshot, ProbeError, ServiceId};
use crate::status::StatusStore;
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of one poll request.
#[derive(Debug, Clone)]
pub enum ProbeResult {
    /// Service answered with a valid snapshot
    Success {
        latency_ms: u64,
        snapshot: HealthSnapshot,
    },
    /// Request failed, was rejected, or returned an invalid body
    Failure { error: ProbeError },
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeResult::Success { .. })
    }
}

/// Fixed-interval poller for every monitored service.
pub struct Poller {
    source: Arc<dyn HealthSource>,
    store: Arc<StatusStore>,
    interval: Duration,
}

impl Poller {
    pub fn new(source: Arc<dyn HealthSource>, store: Arc<StatusStore>, interval: Duration) -> Self {
        Self {
            source,
            store,
            interval,
        }
    }

    /// Probe one service, measuring the round trip.
    pub async fn probe(&self, service: ServiceId) -> ProbeResult {
        let start = Instant::now();

        match self.source.fetch(service).await {
            Ok(snapshot) => ProbeResult::Success {
                latency_ms: round_millis(start.elapsed()),
                snapshot,
            },
            Err(error) => ProbeResult::Failure { error },
        }
    }

    /// Apply a probe result to the status store.
    pub fn apply_result(&self, service: ServiceId, result: &ProbeResult) {
        match result {
            ProbeResult::Success {
                latency_ms,
                snapshot,
            } => {
                metrics::histogram!("pulse_service_latency_seconds",
                    "service" => service.as_str()
                )
                .record(*latency_ms as f64 / 1000.0);

                let previous = self.store.get(service);
                self.store.mark_live(service, snapshot.clone(), *latency_ms);
                if !previous.connected() {
                    tracing::info!(service = %service, latency_ms, "Service reachable");
                }
            }
            ProbeResult::Failure { error } => {
                let previous = self.store.get(service);
                self.store.mark_down(service);
                if previous.connected() {
                    tracing::warn!(service = %service, error = %error, "Service unreachable");
                } else {
                    tracing::debug!(service = %service, error = %error, "Service still unreachable");
                }
            }
        }
    }

    /// Probe every service concurrently and apply each result on arrival.
    pub async fn poll_all(&self) -> Vec<(ServiceId, ProbeResult)> {
        let probes = ServiceId::ALL.into_iter().map(|service| async move {
            let result = self.probe(service).await;
            self.apply_result(service, &result);
            (service, result)
        });

        join_all(probes).await
    }

    /// Start the polling task. The first tick runs immediately; the store is
    /// marked ready once every service has a first result. At most one
    /// request per service is in flight.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let poller = &self;
            let mut interval = tokio::time::interval(poller.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let mut in_flight = FuturesUnordered::new();
            let mut busy: HashSet<ServiceId> = HashSet::new();
            let mut awaiting_first: HashSet<ServiceId> = ServiceId::ALL.into_iter().collect();

            tracing::info!(
                interval_ms = poller.interval.as_millis() as u64,
                "Poller started"
            );

            // Dropping `in_flight` on cancellation abandons outstanding
            // requests, so no update lands after teardown.
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = interval.tick() => {
                        for service in ServiceId::ALL {
                            if busy.insert(service) {
                                in_flight.push(async move {
                                    (service, poller.probe(service).await)
                                });
                            } else {
                                tracing::debug!(service = %service, "Previous poll still in flight, skipping tick");
                            }
                        }
                    }
                    Some((service, result)) = in_flight.next(), if !in_flight.is_empty() => {
                        busy.remove(&service);
                        poller.apply_result(service, &result);
                        if awaiting_first.remove(&service) && awaiting_first.is_empty() {
                            poller.store.mark_ready();
                            tracing::debug!("First poll completed for every service");
                        }
                    }
                }
            }

            tracing::info!("Poller shutting down");
        })
    }
}

/// Round a duration to whole milliseconds.
fn round_millis(elapsed: Duration) -> u64 {
    ((elapsed.as_nanos() + 500_000) / 1_000_000) as u64
}
