//! Connection manager for the monitored services.
//!
//! For each service this module keeps exactly one live source of health
//! data, converts raw wire events into status store updates, and recovers
//! from failures. Two interchangeable strategies are supported:
//!
//! - [`Strategy::Stream`]: a server-sent event stream per service guarded by
//!   a heartbeat watchdog, reopened after a fixed delay on any failure.
//! - [`Strategy::Poll`]: one shared fixed-interval tick probing both services
//!   concurrently.
//!
//! Mounting returns a [`MonitorHandle`]; shutting it down (or dropping it)
//! cancels every task, closing all channels and discarding all timers.

mod config;
pub mod link;
pub mod poll;
pub mod source;
pub mod sse;
mod stream;


pub use config::*;
pub use link::{LinkAction, LinkEvent, LinkPhase, StreamLink};
pub use poll::{Poller, ProbeResult};
pub use source::{HealthSource, HealthStream, HttpHealthSource};

use crate::config::PulseConfig;
use crate::health::{ProbeError, ServiceId};
use crate::status::StatusStore;
use std::sync::Arc;
use stream::StreamDriver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the monitoring strategy for every service.
pub struct ConnectionManager {
    /// Transport used to reach the services
    source: Arc<dyn HealthSource>,
    /// Store updated by the manager
    store: Arc<StatusStore>,
    /// Strategy and timing configuration
    config: MonitorConfig,
}

impl ConnectionManager {
    pub fn new(
        source: Arc<dyn HealthSource>,
        store: Arc<StatusStore>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Create a manager talking HTTP to the configured service roots.
    pub fn from_config(config: &PulseConfig, store: Arc<StatusStore>) -> Result<Self, ProbeError> {
        let source = HttpHealthSource::new(&config.services, config.monitor.request_timeout_seconds)?;
        Ok(Self::new(Arc::new(source), store, config.monitor.clone()))
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    /// Start monitoring every service with the configured strategy.
    pub fn mount(self) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let strategy = self.config.strategy;

        tracing::info!(strategy = %strategy, "Mounting service monitor");

        let tasks = match strategy {
            Strategy::Stream => {
                let tasks = ServiceId::ALL
                    .into_iter()
                    .map(|service| {
                        StreamDriver::new(
                            service,
                            Arc::clone(&self.source),
                            Arc::clone(&self.store),
                            self.config.clone(),
                            cancel.clone(),
                        )
                        .start()
                    })
                    .collect();
                // Streams report asynchronously; the view is usable at once.
                self.store.mark_ready();
                tasks
            }
            Strategy::Poll => {
                let poller = Poller::new(
                    Arc::clone(&self.source),
                    Arc::clone(&self.store),
                    self.config.poll_interval(),
                );
                vec![poller.start(cancel.clone())]
            }
        };

        MonitorHandle {
            cancel,
            tasks,
            store: self.store,
            strategy,
        }
    }
}

/// Running monitor. Dropping the handle cancels all monitoring tasks.
pub struct MonitorHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    store: Arc<StatusStore>,
    strategy: Strategy,
}

impl MonitorHandle {
    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Whether any monitoring task is still running.
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Stop monitoring and wait until every channel and timer is released.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Monitor task ended abnormally");
            }
        }
        tracing::info!("Service monitor unmounted");
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
