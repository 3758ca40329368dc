//! Status store for the monitored services.
//!
//! Holds, per service, the connectivity flag, last snapshot, last latency and
//! bounded latency history. The store performs no I/O and owns no timers; it
//! is driven exclusively by the connection manager and read by the
//! presentation layer through [`StatusStore::snapshot`] or update broadcasts.

mod history;
mod state;

pub use history::{LatencyHistory, LATENCY_HISTORY_LEN};
pub use state::{Latency, ServiceStatusState};

use crate::health::{HealthSnapshot, ServiceId};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::{broadcast, watch};

/// Read-only view of every monitored service.
pub type StatusesMap = BTreeMap<ServiceId, ServiceStatusState>;

/// Change notification sent to presentation subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub service: ServiceId,
    pub state: ServiceStatusState,
}

/// Session-lifetime status container.
pub struct StatusStore {
    /// Per-service state, keyed by the fixed service set
    entries: DashMap<ServiceId, ServiceStatusState>,
    /// Flips to true once the first results are available
    ready: watch::Sender<bool>,
    /// Optional broadcast sender for presentation updates
    updates: Option<broadcast::Sender<StatusUpdate>>,
}

impl StatusStore {
    /// Create a store with every service disconnected and unknown.
    pub fn new() -> Self {
        let entries = DashMap::new();
        for service in ServiceId::ALL {
            entries.insert(service, ServiceStatusState::initial());
        }
        let (ready, _) = watch::channel(false);

        Self {
            entries,
            ready,
            updates: None,
        }
    }

    /// Set the broadcast sender for presentation updates.
    pub fn with_broadcast(mut self, sender: broadcast::Sender<StatusUpdate>) -> Self {
        self.updates = Some(sender);
        self
    }

    /// Record a successful sample for `service`.
    ///
    /// The history append happens under the entry lock so concurrent updates
    /// to the same service cannot lose samples.
    pub fn mark_live(
        &self,
        service: ServiceId,
        snapshot: HealthSnapshot,
        latency_ms: u64,
    ) -> ServiceStatusState {
        let updated = {
            let mut entry = self
                .entries
                .entry(service)
                .or_insert_with(ServiceStatusState::initial);
            let next = entry.with_live(snapshot, latency_ms);
            *entry = next.clone();
            next
        };
        self.publish(service, &updated);
        updated
    }

    /// Record a failure for `service`, keeping its last snapshot and history.
    pub fn mark_down(&self, service: ServiceId) -> ServiceStatusState {
        let updated = {
            let mut entry = self
                .entries
                .entry(service)
                .or_insert_with(ServiceStatusState::initial);
            let next = entry.with_down();
            *entry = next.clone();
            next
        };
        self.publish(service, &updated);
        updated
    }

    /// Current state of one service.
    pub fn get(&self, service: ServiceId) -> ServiceStatusState {
        self.entries
            .get(&service)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Consistent copy of both entries.
    pub fn snapshot(&self) -> StatusesMap {
        ServiceId::ALL
            .into_iter()
            .map(|service| (service, self.get(service)))
            .collect()
    }

    /// True until the first results for every service have been recorded.
    pub fn is_loading(&self) -> bool {
        !*self.ready.borrow()
    }

    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    /// Resolve once [`mark_ready`](Self::mark_ready) has been called.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    fn publish(&self, service: ServiceId, state: &ServiceStatusState) {
        if let Some(sender) = &self.updates {
            // Ignore error if no receivers are listening
            let _ = sender.send(StatusUpdate {
                service,
                state: state.clone(),
            });
        }
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
