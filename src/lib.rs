//! Live metric stream coordination for the small-cell operator console
//!
//! The console shows continuously updating metric charts for whatever node
//! and dashboard tab the operator has selected. This crate owns the hard
//! part of that: turning a cold historical query plus a continuous
//! poll/push feed into a single, monotonically-growing, de-duplicated time
//! series per channel — and keeping it correct while the operator flips
//! between nodes and tabs with fetches still in flight.
//!
//! The moving pieces:
//!
//! - [`MetricSet`] / [`ChannelBuffer`]: per-selection sample storage with a
//!   strictly-increasing-timestamp invariant
//! - [`StreamCoordinator`]: epoch-gated orchestration of the historical
//!   seed, the poll loop and the live merger
//! - [`MetricTransport`]: the seam to the upstream metric services
//! - [`SimTransport`]: a scripted/synthetic transport for tests and the
//!   `metric-stream-sim` binary
//!
//! Stale asynchronous results are discarded by epoch comparison, never by
//! relying on cancellation alone; see [`StreamCoordinator`] for the rules.

pub mod args;
pub mod config;
pub mod coordinator;
pub mod feed_error;
pub mod logging;
pub mod runtime;
pub mod series;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::{
    ChannelSpec, Config, ConfigSource, CoordinatorConfig, FeedMode, TabCatalogue,
    create_default_config, load_config, load_config_with_fallback,
};
pub use coordinator::{CoordinatorStats, FeedState, StatsSnapshot, StreamCoordinator};
pub use feed_error::FeedError;
pub use series::{ChannelBuffer, ChannelState, MergeOutcome, MetricSet, Sample};
pub use transport::{
    ChannelBatch, FetchRequest, FetchResponse, MetricEvent, MetricSubscription, MetricTransport,
    ScriptedFetch, SimTransport, TimeWindow,
};
pub use types::{ChannelId, EntityId, EntityKind, Epoch, Selection, StepSeconds, TabId};
