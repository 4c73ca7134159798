//! Append-only, time-ordered sample buffer for one metric channel

use crate::types::ChannelId;
use serde::{Deserialize, Serialize};

/// A single measured value on a metric channel
///
/// Immutable once created. Timestamps are unix seconds and are strictly
/// increasing within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix timestamp in seconds
    #[serde(rename = "x")]
    pub timestamp: u64,
    /// Measured value
    #[serde(rename = "y")]
    pub value: f64,
}

impl Sample {
    /// Create a new sample
    #[must_use]
    pub const fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// In-memory sample buffer for one metric channel.
///
/// Invariant: `samples` is strictly increasing by timestamp; no two samples
/// share a timestamp. The buffer is owned exclusively by the [`MetricSet`]
/// that contains it and is mutated only by seed/merge operations.
///
/// [`MetricSet`]: crate::series::MetricSet
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBuffer {
    id: ChannelId,
    display_name: String,
    samples: Vec<Sample>,
}

impl ChannelBuffer {
    /// Create an empty buffer ("loaded, no data" — distinct from a channel
    /// that has not been fetched yet)
    #[must_use]
    pub fn empty(id: ChannelId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            samples: Vec::new(),
        }
    }

    /// Create a buffer seeded from a historical batch.
    ///
    /// The batch is sorted ascending by timestamp; duplicate timestamps
    /// collapse keeping the last occurrence.
    #[must_use]
    pub fn seeded(id: ChannelId, display_name: impl Into<String>, mut samples: Vec<Sample>) -> Self {
        normalize(&mut samples);
        Self {
            id,
            display_name: display_name.into(),
            samples,
        }
    }

    /// Channel id this buffer belongs to
    #[must_use]
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Human-readable channel name
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The stored samples, strictly increasing by timestamp
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of stored samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the newest stored sample, if any
    #[must_use]
    pub fn last_timestamp(&self) -> Option<u64> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Append the subsequence of `batch` that is strictly newer than the
    /// buffer tail.
    ///
    /// Samples at or before the current last timestamp are dropped, so
    /// re-delivery of already-stored data appends nothing. Batches are
    /// normally pre-sorted; an out-of-order batch is sorted (and
    /// last-wins deduplicated) before filtering.
    ///
    /// Returns the number of samples actually appended.
    pub fn merge(&mut self, batch: &[Sample]) -> usize {
        if batch.is_empty() {
            return 0;
        }

        if is_strictly_increasing(batch) {
            self.append_newer(batch)
        } else {
            let mut owned = batch.to_vec();
            normalize(&mut owned);
            self.append_newer(&owned)
        }
    }

    /// Append samples from a strictly-increasing slice, skipping anything
    /// at or before the current tail.
    fn append_newer(&mut self, sorted: &[Sample]) -> usize {
        let start = match self.last_timestamp() {
            Some(last) => sorted.partition_point(|s| s.timestamp <= last),
            None => 0,
        };
        let newer = &sorted[start..];
        self.samples.extend_from_slice(newer);
        newer.len()
    }
}

/// Sort ascending by timestamp and collapse duplicate timestamps keeping
/// the last occurrence.
fn normalize(samples: &mut Vec<Sample>) {
    // Stable sort keeps the original relative order of equal timestamps,
    // so "last occurrence" survives the dedup below.
    samples.sort_by_key(|s| s.timestamp);
    samples.dedup_by(|later, kept| {
        if later.timestamp == kept.timestamp {
            *kept = *later;
            true
        } else {
            false
        }
    });
}

fn is_strictly_increasing(samples: &[Sample]) -> bool {
    samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}
