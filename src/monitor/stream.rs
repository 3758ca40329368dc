//! Streaming strategy driver.
//!
//! Runs one [`StreamLink`] per service inside its own task and carries out the
//! actions it requests with tokio timers. The task exclusively owns the
//! service's channel and timer deadlines; they are released when the task
//! ends, which happens only on cancellation.

use super::link::{LinkAction, LinkEvent, StreamLink};
use super::source::{HealthSource, HealthStream};
use super::MonitorConfig;
use crate::health::{HealthSnapshot, ProbeError, ServiceId};
use crate::status::StatusStore;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// An open channel tagged with the generation it was opened for.
struct OpenChannel {
    generation: u64,
    stream: HealthStream,
}

/// Channel and timers owned by one service's driver.
#[derive(Default)]
struct LinkResources {
    channel: Option<OpenChannel>,
    heartbeat: Option<(u64, Instant)>,
    retry: Option<Instant>,
}

impl LinkResources {
    fn release(&mut self) {
        self.channel = None;
        self.heartbeat = None;
        self.retry = None;
    }
}

/// Drives the streaming state machine of a single service.
pub(crate) struct StreamDriver {
    service: ServiceId,
    source: Arc<dyn HealthSource>,
    store: Arc<StatusStore>,
    config: MonitorConfig,
    cancel: CancellationToken,
}

impl StreamDriver {
    pub(crate) fn new(
        service: ServiceId,
        source: Arc<dyn HealthSource>,
        store: Arc<StatusStore>,
        config: MonitorConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            source,
            store,
            config,
            cancel,
        }
    }

    pub(crate) fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut link = StreamLink::new(
            self.service,
            self.config.heartbeat_timeout(),
            self.config.retry_delay(),
        );
        let mut resources = LinkResources::default();

        let actions = link.connect();
        self.execute(actions, &mut resources);

        loop {
            let heartbeat = resources.heartbeat;
            let retry = resources.retry;

            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                (generation, item) = next_item(&mut resources.channel) => match item {
                    Some(Ok(snapshot)) => LinkEvent::Message {
                        generation,
                        snapshot,
                        received_at_ms: chrono::Utc::now().timestamp_millis(),
                    },
                    Some(Err(error)) => LinkEvent::TransportError { generation, error },
                    None => LinkEvent::TransportError {
                        generation,
                        error: ProbeError::StreamClosed,
                    },
                },
                generation = heartbeat_elapsed(heartbeat) => LinkEvent::HeartbeatTimeout { generation },
                _ = retry_elapsed(retry) => LinkEvent::RetryFired,
            };

            let actions = link.handle(event);
            self.execute(actions, &mut resources);
        }

        let actions = link.shutdown();
        self.execute(actions, &mut resources);
        resources.release();
        tracing::debug!(service = %self.service, "Stream link released");
    }

    fn execute(&self, actions: Vec<LinkAction>, resources: &mut LinkResources) {
        let now = Instant::now();
        for action in actions {
            match action {
                LinkAction::Open { generation } => {
                    if generation > 1 {
                        metrics::counter!("pulse_reconnects_total",
                            "service" => self.service.as_str()
                        )
                        .increment(1);
                    }
                    resources.channel = Some(OpenChannel {
                        generation,
                        stream: self.source.subscribe(self.service),
                    });
                }
                LinkAction::Close { generation } => {
                    if resources
                        .channel
                        .as_ref()
                        .is_some_and(|open| open.generation == generation)
                    {
                        resources.channel = None;
                    }
                }
                LinkAction::ArmHeartbeat { generation, after } => {
                    resources.heartbeat = Some((generation, now + after));
                }
                LinkAction::CancelHeartbeat => resources.heartbeat = None,
                LinkAction::ScheduleRetry { after } => {
                    tracing::info!(
                        service = %self.service,
                        retry_in_ms = after.as_millis() as u64,
                        "Scheduling reconnect"
                    );
                    resources.retry = Some(now + after);
                }
                LinkAction::CancelRetry => resources.retry = None,
                LinkAction::MarkLive {
                    snapshot,
                    latency_ms,
                } => {
                    metrics::histogram!("pulse_service_latency_seconds",
                        "service" => self.service.as_str()
                    )
                    .record(latency_ms as f64 / 1000.0);
                    self.store.mark_live(self.service, snapshot, latency_ms);
                }
                LinkAction::MarkDown { .. } => {
                    self.store.mark_down(self.service);
                }
            }
        }
    }
}

async fn next_item(
    channel: &mut Option<OpenChannel>,
) -> (u64, Option<Result<HealthSnapshot, ProbeError>>) {
    match channel {
        Some(open) => (open.generation, open.stream.next().await),
        None => std::future::pending().await,
    }
}

async fn heartbeat_elapsed(deadline: Option<(u64, Instant)>) -> u64 {
    match deadline {
        Some((generation, at)) => {
            tokio::time::sleep_until(at).await;
            generation
        }
        None => std::future::pending().await,
    }
}

async fn retry_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
