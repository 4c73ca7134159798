//! Lock-free counters for coordinator activity
//!
//! Updated from the fetch/poll/live hot paths with atomic operations;
//! safe to read concurrently from any thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe activity counters for one coordinator
#[derive(Debug, Clone, Default)]
pub struct CoordinatorStats {
    inner: Arc<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    selections: AtomicU64,
    fetches_issued: AtomicU64,
    fetches_failed: AtomicU64,
    stale_results_discarded: AtomicU64,
    poll_cycles: AtomicU64,
    live_events: AtomicU64,
    batches_merged: AtomicU64,
    samples_appended: AtomicU64,
    unknown_channel_batches: AtomicU64,
}

/// Point-in-time copy of the counters, for display and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub selections: u64,
    pub fetches_issued: u64,
    pub fetches_failed: u64,
    pub stale_results_discarded: u64,
    pub poll_cycles: u64,
    pub live_events: u64,
    pub batches_merged: u64,
    pub samples_appended: u64,
    pub unknown_channel_batches: u64,
}

impl CoordinatorStats {
    /// Create a fresh set of counters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_selection(&self) {
        self.inner.selections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_issued(&self) {
        self.inner.fetches_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_failed(&self) {
        self.inner.fetches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_result(&self) {
        self.inner
            .stale_results_discarded
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_poll_cycle(&self) {
        self.inner.poll_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_live_event(&self) {
        self.inner.live_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merge(&self, samples_appended: usize) {
        self.inner.batches_merged.fetch_add(1, Ordering::Relaxed);
        self.inner
            .samples_appended
            .fetch_add(samples_appended as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown_channel(&self) {
        self.inner
            .unknown_channel_batches
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            selections: self.inner.selections.load(Ordering::Relaxed),
            fetches_issued: self.inner.fetches_issued.load(Ordering::Relaxed),
            fetches_failed: self.inner.fetches_failed.load(Ordering::Relaxed),
            stale_results_discarded: self.inner.stale_results_discarded.load(Ordering::Relaxed),
            poll_cycles: self.inner.poll_cycles.load(Ordering::Relaxed),
            live_events: self.inner.live_events.load(Ordering::Relaxed),
            batches_merged: self.inner.batches_merged.load(Ordering::Relaxed),
            samples_appended: self.inner.samples_appended.load(Ordering::Relaxed),
            unknown_channel_batches: self.inner.unknown_channel_batches.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = CoordinatorStats::new();
        stats.record_selection();
        stats.record_fetch_issued();
        stats.record_merge(3);
        stats.record_merge(0);
        stats.record_stale_result();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.selections, 1);
        assert_eq!(snapshot.fetches_issued, 1);
        assert_eq!(snapshot.batches_merged, 2);
        assert_eq!(snapshot.samples_appended, 3);
        assert_eq!(snapshot.stale_results_discarded, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let stats = CoordinatorStats::new();
        let clone = stats.clone();
        clone.record_poll_cycle();
        assert_eq!(stats.snapshot().poll_cycles, 1);
    }
}
