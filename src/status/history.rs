//! Bounded latency history
//!
//! Keeps the most recent latency samples of one service for the dashboard
//! sparkline. Older samples are evicted first.

use serde::Serialize;
use std::collections::VecDeque;

/// Number of samples retained per service.
pub const LATENCY_HISTORY_LEN: usize = 5;

/// Ring of the last [`LATENCY_HISTORY_LEN`] successful latency samples, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LatencyHistory {
    samples: VecDeque<u64>,
}

impl LatencyHistory {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(LATENCY_HISTORY_LEN),
        }
    }

    /// Returns a copy with `latency_ms` appended, evicting the oldest sample at capacity.
    pub fn pushed(&self, latency_ms: u64) -> Self {
        let mut next = self.clone();
        if next.samples.len() >= LATENCY_HISTORY_LEN {
            next.samples.pop_front();
        }
        next.samples.push_back(latency_ms);
        next
    }

    /// Samples in arrival order (oldest first)
    pub fn to_vec(&self) -> Vec<u64> {
        self.samples.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    pub fn latest(&self) -> Option<u64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FromIterator<u64> for LatencyHistory {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        iter.into_iter()
            .fold(LatencyHistory::new(), |history, sample| history.pushed(sample))
    }
}
