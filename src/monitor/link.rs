//! Per-service streaming state machine.
//!
//! A [`StreamLink`] decides what should happen to one service's event stream
//! without performing any I/O itself: each event yields a list of
//! [`LinkAction`]s for the driver to carry out. Every channel the link opens
//! gets a new generation number, and events tagged with an older generation
//! are discarded so a late message from a superseded connection can never
//! overwrite current state.

use crate::health::{HealthSnapshot, ProbeError, ServiceId};
use std::time::Duration;

/// Lifecycle phase of a stream link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Channel opened, no message yet
    Connecting,
    /// At least one message received on the current channel
    Live,
    /// Channel closed, retry pending
    Disconnected,
    /// Torn down; ignores every event
    Stopped,
}

/// Input to the state machine.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// A parsed message arrived on channel `generation`.
    Message {
        generation: u64,
        snapshot: HealthSnapshot,
        /// Local wall clock at receipt, epoch milliseconds
        received_at_ms: i64,
    },
    /// The channel reported an error or closed.
    TransportError { generation: u64, error: ProbeError },
    /// The heartbeat armed for `generation` expired.
    HeartbeatTimeout { generation: u64 },
    /// The pending retry delay elapsed.
    RetryFired,
}

/// Side effect requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkAction {
    Open { generation: u64 },
    Close { generation: u64 },
    /// Replace any armed heartbeat with a new deadline.
    ArmHeartbeat { generation: u64, after: Duration },
    CancelHeartbeat,
    ScheduleRetry { after: Duration },
    CancelRetry,
    MarkLive { snapshot: HealthSnapshot, latency_ms: u64 },
    MarkDown { error: ProbeError },
}

/// Streaming state of one service.
#[derive(Debug)]
pub struct StreamLink {
    service: ServiceId,
    heartbeat_timeout: Duration,
    retry_delay: Duration,
    phase: LinkPhase,
    generation: u64,
    channel_open: bool,
    heartbeat_armed: bool,
    retry_pending: bool,
}

impl StreamLink {
    pub fn new(service: ServiceId, heartbeat_timeout: Duration, retry_delay: Duration) -> Self {
        Self {
            service,
            heartbeat_timeout,
            retry_delay,
            phase: LinkPhase::Disconnected,
            generation: 0,
            channel_open: false,
            heartbeat_armed: false,
            retry_pending: false,
        }
    }

    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    /// Generation of the most recently opened channel (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn channel_open(&self) -> bool {
        self.channel_open
    }

    pub fn heartbeat_armed(&self) -> bool {
        self.heartbeat_armed
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Open a fresh channel and arm its heartbeat so a dead connection is
    /// caught even if it never delivers a message.
    pub fn connect(&mut self) -> Vec<LinkAction> {
        if self.phase == LinkPhase::Stopped {
            return Vec::new();
        }

        let mut actions = Vec::with_capacity(4);
        if self.retry_pending {
            self.retry_pending = false;
            actions.push(LinkAction::CancelRetry);
        }
        if self.channel_open {
            actions.push(LinkAction::Close {
                generation: self.generation,
            });
        }

        self.generation += 1;
        self.phase = LinkPhase::Connecting;
        self.channel_open = true;
        self.heartbeat_armed = true;

        tracing::debug!(
            service = %self.service,
            generation = self.generation,
            "Opening event stream"
        );

        actions.push(LinkAction::Open {
            generation: self.generation,
        });
        actions.push(LinkAction::ArmHeartbeat {
            generation: self.generation,
            after: self.heartbeat_timeout,
        });
        actions
    }

    /// Apply one event.
    pub fn handle(&mut self, event: LinkEvent) -> Vec<LinkAction> {
        match event {
            LinkEvent::Message {
                generation,
                snapshot,
                received_at_ms,
            } => self.on_message(generation, snapshot, received_at_ms),
            LinkEvent::TransportError { generation, error } => self.disconnect(generation, error),
            LinkEvent::HeartbeatTimeout { generation } => {
                let error = ProbeError::HeartbeatTimeout(self.heartbeat_timeout.as_millis() as u64);
                self.disconnect(generation, error)
            }
            LinkEvent::RetryFired => {
                if !self.retry_pending || self.phase == LinkPhase::Stopped {
                    return Vec::new();
                }
                self.connect()
            }
        }
    }

    /// Release the channel and every timer. The link ignores all later events.
    pub fn shutdown(&mut self) -> Vec<LinkAction> {
        let mut actions = Vec::with_capacity(3);
        if self.channel_open {
            actions.push(LinkAction::Close {
                generation: self.generation,
            });
        }
        if self.heartbeat_armed {
            actions.push(LinkAction::CancelHeartbeat);
        }
        if self.retry_pending {
            actions.push(LinkAction::CancelRetry);
        }

        self.channel_open = false;
        self.heartbeat_armed = false;
        self.retry_pending = false;
        self.phase = LinkPhase::Stopped;
        actions
    }

    fn is_current(&self, generation: u64) -> bool {
        self.phase != LinkPhase::Stopped && self.channel_open && generation == self.generation
    }

    fn on_message(
        &mut self,
        generation: u64,
        snapshot: HealthSnapshot,
        received_at_ms: i64,
    ) -> Vec<LinkAction> {
        if !self.is_current(generation) {
            tracing::debug!(
                service = %self.service,
                generation,
                current = self.generation,
                "Discarding message from superseded channel"
            );
            return Vec::new();
        }

        let Some(emitted_at_ms) = snapshot.own.emitted_at_ms else {
            return self.disconnect(
                generation,
                ProbeError::ParseError("message carries no emission timestamp".to_string()),
            );
        };
        let latency_ms = received_at_ms.saturating_sub(emitted_at_ms).max(0) as u64;

        if self.phase == LinkPhase::Connecting {
            tracing::info!(service = %self.service, generation, "Service connected");
        }
        self.phase = LinkPhase::Live;
        self.heartbeat_armed = true;

        vec![
            LinkAction::ArmHeartbeat {
                generation,
                after: self.heartbeat_timeout,
            },
            LinkAction::MarkLive {
                snapshot,
                latency_ms,
            },
        ]
    }

    /// Close the current channel and schedule a retry unless one is pending.
    /// Failure signals for a channel that is already closed are dropped.
    fn disconnect(&mut self, generation: u64, error: ProbeError) -> Vec<LinkAction> {
        if !self.is_current(generation) {
            tracing::debug!(
                service = %self.service,
                generation,
                error = %error,
                "Ignoring failure for closed channel"
            );
            return Vec::new();
        }

        tracing::warn!(
            service = %self.service,
            generation,
            error = %error,
            "Service connection lost"
        );

        self.phase = LinkPhase::Disconnected;
        self.channel_open = false;
        self.heartbeat_armed = false;

        let mut actions = vec![
            LinkAction::MarkDown { error },
            LinkAction::Close { generation },
            LinkAction::CancelHeartbeat,
        ];
        if !self.retry_pending {
            self.retry_pending = true;
            actions.push(LinkAction::ScheduleRetry {
                after: self.retry_delay,
            });
        }
        actions
    }
}
