//! Time-series storage for the live metric feed
//!
//! This module provides:
//! - [`ChannelBuffer`]: append-only, strictly time-ordered samples for one channel
//! - [`MetricSet`]: the per-selection collection of buffers, keyed by channel id

mod buffer;
mod set;

pub use buffer::{ChannelBuffer, Sample};
pub use set::{ChannelState, MergeOutcome, MetricSet};
