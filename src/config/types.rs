//! Configuration type definitions
//!
//! This module contains the coordinator settings and the per-tab channel
//! catalogue the MetricSet is created from.

use crate::types::{ChannelId, EntityKind, Selection, StepSeconds, TabId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the coordinator arms the continuous feed after the historical seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Decide from the first response's hint: more data pending means poll,
    /// otherwise subscribe to the push feed
    Auto,
    /// Always poll, never subscribe
    Polling,
    /// Always subscribe, never poll
    Live,
}

impl Default for FeedMode {
    /// Auto is the default: the backend hint knows whether a catch-up is
    /// needed, and deployments with an unreliable hint can force a path.
    fn default() -> Self {
        Self::Auto
    }
}

impl FeedMode {
    /// Whether this mode ever issues poll cycles
    #[must_use]
    pub const fn allows_polling(&self) -> bool {
        matches!(self, Self::Auto | Self::Polling)
    }

    /// Whether this mode ever opens a push subscription
    #[must_use]
    pub const fn allows_live(&self) -> bool {
        matches!(self, Self::Auto | Self::Live)
    }

    /// Get a human-readable description of this mode
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto (hint-driven)",
            Self::Polling => "polling only",
            Self::Live => "live subscription only",
        }
    }
}

impl std::fmt::Display for FeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Coordinator timing and feed settings
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    /// Per-tab channel catalogues
    #[serde(default)]
    pub catalogue: Vec<TabCatalogue>,
}

/// Coordinator timing and feed settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Settle delay after a selection change before the fetch is issued,
    /// in milliseconds; rapid re-selections within the window coalesce
    pub settle_delay_ms: u64,
    /// Width of the historical seed window, in seconds
    pub window_seconds: u64,
    /// Query resolution step
    pub step_seconds: StepSeconds,
    /// How to arm the continuous feed after the seed
    pub feed_mode: FeedMode,
    /// Number of worker threads (default: 1, the coordinator is cooperative)
    pub threads: usize,
}

impl CoordinatorConfig {
    /// Settle delay as a [`Duration`]
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: super::defaults::settle_delay_ms(),
            window_seconds: super::defaults::window_seconds(),
            step_seconds: StepSeconds::default(),
            feed_mode: FeedMode::default(),
            threads: super::defaults::threads(),
        }
    }
}

/// One channel declared by a tab's catalogue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSpec {
    /// Channel id, as the upstream services name it
    pub id: ChannelId,
    /// Label shown until a fetch reports a display name
    pub label: String,
}

/// The channel catalogue for one dashboard tab.
///
/// Catalogues can differ by entity kind: the radio tab of an access point
/// declares channels a gateway does not have. `entity_kind = None` applies
/// to every kind that has no kind-specific entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabCatalogue {
    /// Tab this catalogue belongs to
    pub tab: TabId,
    /// Restrict to one entity kind; None matches any kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_kind: Option<EntityKind>,
    /// Channels the tab displays
    pub channels: Vec<ChannelSpec>,
}

impl Config {
    /// Channels declared for a selection.
    ///
    /// A kind-specific catalogue entry wins over a kind-agnostic one; a
    /// selection with no matching entry gets an empty catalogue (the tab
    /// simply has no metric panels for that kind).
    #[must_use]
    pub fn channels_for(&self, selection: &Selection) -> &[ChannelSpec] {
        let mut fallback: Option<&TabCatalogue> = None;
        for entry in &self.catalogue {
            if entry.tab != selection.tab {
                continue;
            }
            match entry.entity_kind {
                Some(kind) if kind == selection.kind => return &entry.channels,
                Some(_) => {}
                None => fallback = Some(entry),
            }
        }
        fallback.map(|entry| entry.channels.as_slice()).unwrap_or(&[])
    }
}
