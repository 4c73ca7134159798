//! Transport seam to the upstream metric services
//!
//! The coordinator never talks to the network directly; it goes through the
//! [`MetricTransport`] trait so the real GraphQL/REST client, the simulated
//! transport, and test scripts are interchangeable.

mod sim;

pub use sim::{ScriptedFetch, SimTransport};

use crate::feed_error::FeedError;
use crate::series::Sample;
use crate::types::{ChannelId, Selection, StepSeconds};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

/// Bounded (historical) or open-ended (poll) query window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// First second covered by the query (inclusive)
    pub from: u64,
    /// Last second covered (inclusive); None means "everything since `from`"
    pub to: Option<u64>,
    /// Query resolution
    pub step: StepSeconds,
}

impl TimeWindow {
    /// Bounded window for the historical seed query
    #[must_use]
    pub const fn bounded(from: u64, to: u64, step: StepSeconds) -> Self {
        Self {
            from,
            to: Some(to),
            step,
        }
    }

    /// Open-ended window for poll cycles ("everything since")
    #[must_use]
    pub const fn open_ended(from: u64, step: StepSeconds) -> Self {
        Self {
            from,
            to: None,
            step,
        }
    }
}

/// One metric query issued by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// The selection the query belongs to
    pub selection: Selection,
    /// The time window to cover
    pub window: TimeWindow,
}

/// One channel's worth of samples inside a response or push event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBatch {
    /// Channel the samples belong to
    pub id: ChannelId,
    /// Display name reported by the upstream service
    pub name: String,
    /// Samples, normally pre-sorted ascending by timestamp
    pub samples: Vec<Sample>,
}

impl ChannelBatch {
    /// Create a batch
    #[must_use]
    pub fn new(id: ChannelId, name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            id,
            name: name.into(),
            samples,
        }
    }
}

/// Response to a [`FetchRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// Per-channel sample batches
    pub channels: Vec<ChannelBatch>,
    /// Whether more data may exist beyond this response
    pub more: bool,
    /// Last second covered by this response; the next poll starts after it
    pub cursor: u64,
}

/// One event delivered on the push feed
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    /// Per-channel sample batches carried by the event
    pub channels: Vec<ChannelBatch>,
}

/// Handle to an active push-feed subscription.
///
/// The subscription is a scoped resource: dropping the handle releases it
/// upstream exactly once. The coordinator keeps at most one alive per
/// epoch and drops it deterministically when the epoch changes.
#[derive(Debug)]
pub struct MetricSubscription {
    events: mpsc::Receiver<MetricEvent>,
    _release: Option<DropGuard>,
}

impl MetricSubscription {
    /// Wrap an event receiver without a release hook
    #[must_use]
    pub fn new(events: mpsc::Receiver<MetricEvent>) -> Self {
        Self {
            events,
            _release: None,
        }
    }

    /// Wrap an event receiver with a guard that fires on drop, letting the
    /// transport observe the release
    #[must_use]
    pub fn with_release(events: mpsc::Receiver<MetricEvent>, release: DropGuard) -> Self {
        Self {
            events,
            _release: Some(release),
        }
    }

    /// Wait for the next event; None means the upstream feed closed
    pub async fn next_event(&mut self) -> Option<MetricEvent> {
        self.events.recv().await
    }
}

/// The upstream metric services, as the coordinator sees them.
///
/// `fetch_metrics` covers both the historical seed query and poll cycles
/// (they differ only in the window). Cancellation is the caller's business:
/// the coordinator drops the in-flight future when a newer selection
/// supersedes it, so implementations must tolerate being dropped at any
/// await point.
#[async_trait]
pub trait MetricTransport: Send + Sync + 'static {
    /// Query sample batches for a selection over a time window
    async fn fetch_metrics(&self, request: &FetchRequest) -> Result<FetchResponse, FeedError>;

    /// Open the push feed for a selection
    async fn subscribe_metrics(&self, selection: &Selection)
        -> Result<MetricSubscription, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, EntityKind, TabId};
    use tokio_util::sync::CancellationToken;

    fn selection() -> Selection {
        Selection::new(
            EntityId::new("ap-1").unwrap(),
            EntityKind::AccessPoint,
            TabId::new("overview").unwrap(),
        )
    }

    #[test]
    fn test_time_window_shapes() {
        let step = StepSeconds::default();
        let bounded = TimeWindow::bounded(100, 200, step);
        assert_eq!(bounded.to, Some(200));

        let open = TimeWindow::open_ended(201, step);
        assert_eq!(open.from, 201);
        assert_eq!(open.to, None);
    }

    #[tokio::test]
    async fn test_subscription_release_guard_fires_on_drop() {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(4);
        let sub = MetricSubscription::with_release(rx, token.clone().drop_guard());

        assert!(!token.is_cancelled());
        drop(sub);
        assert!(token.is_cancelled());
        drop(tx);
    }

    #[tokio::test]
    async fn test_subscription_delivers_events() {
        let (tx, rx) = mpsc::channel(4);
        let mut sub = MetricSubscription::new(rx);

        let event = MetricEvent {
            channels: vec![ChannelBatch::new(
                ChannelId::new("cpu_load").unwrap(),
                "CPU load",
                vec![Sample::new(100, 1.0)],
            )],
        };
        tx.send(event.clone()).await.unwrap();
        assert_eq!(sub.next_event().await, Some(event));

        drop(tx);
        assert_eq!(sub.next_event().await, None);
    }

    #[test]
    fn test_fetch_request_carries_selection() {
        let request = FetchRequest {
            selection: selection(),
            window: TimeWindow::open_ended(0, StepSeconds::default()),
        };
        assert_eq!(request.selection.entity_id.as_str(), "ap-1");
    }
}
