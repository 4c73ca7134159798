//! Catalogue-keyed collection of channel buffers for one selection

use crate::series::{ChannelBuffer, Sample};
use crate::types::ChannelId;
use std::collections::HashMap;
use tracing::debug;

/// What a channel currently holds, from the UI's point of view.
///
/// `Loading` means the channel is declared by the catalogue but no fetch has
/// completed for it yet. A `Ready` buffer with zero samples means a fetch
/// completed and returned nothing — the UI renders those two differently.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelState {
    /// Declared but not yet seeded
    Loading,
    /// Seeded (possibly with zero samples)
    Ready(ChannelBuffer),
}

impl ChannelState {
    /// Whether this channel is still waiting for its first data
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The buffer, if the channel has been seeded
    #[must_use]
    pub const fn buffer(&self) -> Option<&ChannelBuffer> {
        match self {
            Self::Loading => None,
            Self::Ready(buffer) => Some(buffer),
        }
    }
}

/// Outcome of a [`MetricSet::merge`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Samples were appended; consumers should re-render
    Appended(usize),
    /// The batch contained nothing newer than the buffer tail
    NoNewData,
    /// The channel is not declared in the current catalogue; batch dropped
    UnknownChannel,
}

impl MergeOutcome {
    /// Number of samples appended
    #[must_use]
    pub const fn appended(&self) -> usize {
        match self {
            Self::Appended(n) => *n,
            Self::NoNewData | Self::UnknownChannel => 0,
        }
    }

    /// Whether anything was appended (drives re-render decisions)
    #[must_use]
    pub const fn did_append(&self) -> bool {
        matches!(self, Self::Appended(_))
    }
}

/// One catalogue entry inside the set
#[derive(Debug, Clone)]
struct ChannelSlot {
    /// Catalogue label, used until (and unless) a fetch provides a name
    label: String,
    state: ChannelState,
}

/// All channel buffers relevant to the current selection.
///
/// Created empty (every channel `Loading`) when a selection is made,
/// replaced wholesale on the next selection, never partially reused.
/// Merges for channels outside the catalogue are dropped silently —
/// upstream catalogues can legitimately differ by node type.
#[derive(Debug, Clone, Default)]
pub struct MetricSet {
    channels: HashMap<ChannelId, ChannelSlot>,
}

impl MetricSet {
    /// Create a set with every catalogue channel mapped to `Loading`
    #[must_use]
    pub fn create_empty<I, S>(catalogue: I) -> Self
    where
        I: IntoIterator<Item = (ChannelId, S)>,
        S: Into<String>,
    {
        let channels = catalogue
            .into_iter()
            .map(|(id, label)| {
                (
                    id,
                    ChannelSlot {
                        label: label.into(),
                        state: ChannelState::Loading,
                    },
                )
            })
            .collect();
        Self { channels }
    }

    /// Overwrite a channel with a freshly seeded buffer.
    ///
    /// Used only by the historical seed step; any prior state for the
    /// channel is replaced. Returns false (and drops the batch) for a
    /// channel outside the catalogue.
    pub fn seed(&mut self, id: &ChannelId, display_name: &str, samples: Vec<Sample>) -> bool {
        let Some(slot) = self.channels.get_mut(id) else {
            debug!(channel = %id, "dropping seed for unknown channel");
            return false;
        };
        slot.state = ChannelState::Ready(ChannelBuffer::seeded(id.clone(), display_name, samples));
        true
    }

    /// Merge a batch into a channel under the strictly-newer rule.
    ///
    /// A merge into a `Loading` channel seeds it implicitly (the batch is
    /// everything the buffer has). Unknown channels are a silent no-op.
    pub fn merge(&mut self, id: &ChannelId, batch: &[Sample]) -> MergeOutcome {
        let Some(slot) = self.channels.get_mut(id) else {
            debug!(channel = %id, "dropping batch for unknown channel");
            return MergeOutcome::UnknownChannel;
        };

        if slot.state.is_loading() {
            slot.state = ChannelState::Ready(ChannelBuffer::empty(id.clone(), slot.label.clone()));
        }
        let appended = match &mut slot.state {
            ChannelState::Ready(buffer) => buffer.merge(batch),
            ChannelState::Loading => unreachable!("channel was just seeded"),
        };
        if appended > 0 {
            MergeOutcome::Appended(appended)
        } else {
            MergeOutcome::NoNewData
        }
    }

    /// Mark every channel still `Loading` as "loaded, empty".
    ///
    /// Applied after the historical seed commits: a catalogue channel the
    /// response did not mention has completed its fetch with no data, and
    /// must not keep the UI spinning.
    pub fn finish_loading(&mut self) {
        for (id, slot) in &mut self.channels {
            if slot.state.is_loading() {
                slot.state =
                    ChannelState::Ready(ChannelBuffer::empty(id.clone(), slot.label.clone()));
            }
        }
    }

    /// Reset every channel to "loaded, empty".
    ///
    /// Applied after a failed fetch so the UI renders a neutral empty state
    /// instead of spinning on `Loading` forever.
    pub fn reset_loaded_empty(&mut self) {
        for (id, slot) in &mut self.channels {
            slot.state = ChannelState::Ready(ChannelBuffer::empty(id.clone(), slot.label.clone()));
        }
    }

    /// Current state of one channel, or None if it is not in the catalogue
    #[must_use]
    pub fn channel(&self, id: &ChannelId) -> Option<&ChannelState> {
        self.channels.get(id).map(|slot| &slot.state)
    }

    /// Iterate over (channel id, state) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&ChannelId, &ChannelState)> {
        self.channels.iter().map(|(id, slot)| (id, &slot.state))
    }

    /// Ids of every declared channel
    pub fn channel_ids(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    /// Number of declared channels
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the catalogue declared no channels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Whether any channel is still waiting for its first data
    #[must_use]
    pub fn any_loading(&self) -> bool {
        self.channels.values().any(|slot| slot.state.is_loading())
    }

    /// Total number of stored samples across all channels
    #[must_use]
    pub fn total_samples(&self) -> usize {
        self.channels
            .values()
            .filter_map(|slot| slot.state.buffer())
            .map(ChannelBuffer::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ChannelId {
        ChannelId::new(s).unwrap()
    }

    fn samples(points: &[(u64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(t, v)| Sample::new(t, v)).collect()
    }

    fn two_channel_set() -> MetricSet {
        MetricSet::create_empty(vec![
            (id("cpu_load"), "CPU load"),
            (id("mem_used"), "Memory used"),
        ])
    }

    #[test]
    fn test_create_empty_marks_all_loading() {
        let set = two_channel_set();
        assert_eq!(set.len(), 2);
        assert!(set.any_loading());
        assert!(set.channel(&id("cpu_load")).unwrap().is_loading());
        assert!(set.channel(&id("mem_used")).unwrap().is_loading());
    }

    #[test]
    fn test_loading_distinct_from_loaded_empty() {
        let mut set = two_channel_set();
        set.seed(&id("cpu_load"), "CPU load", Vec::new());

        // cpu_load completed its fetch with zero samples; mem_used is still waiting
        let cpu = set.channel(&id("cpu_load")).unwrap();
        assert!(!cpu.is_loading());
        assert!(cpu.buffer().unwrap().is_empty());
        assert!(set.channel(&id("mem_used")).unwrap().is_loading());
    }

    #[test]
    fn test_seed_overwrites_prior_state() {
        let mut set = two_channel_set();
        set.seed(&id("cpu_load"), "CPU load", samples(&[(100, 1.0)]));
        set.seed(&id("cpu_load"), "CPU load", samples(&[(200, 2.0)]));

        let buffer = set.channel(&id("cpu_load")).unwrap().buffer().unwrap();
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.last_timestamp(), Some(200));
    }

    #[test]
    fn test_merge_unknown_channel_is_noop() {
        let mut set = two_channel_set();
        let outcome = set.merge(&id("rf_noise"), &samples(&[(100, 1.0)]));

        assert_eq!(outcome, MergeOutcome::UnknownChannel);
        assert_eq!(outcome.appended(), 0);
        assert_eq!(set.len(), 2);
        assert!(set.channel(&id("rf_noise")).is_none());
    }

    #[test]
    fn test_merge_into_loading_seeds_implicitly() {
        let mut set = two_channel_set();
        let outcome = set.merge(&id("cpu_load"), &samples(&[(100, 1.0), (101, 2.0)]));

        assert_eq!(outcome, MergeOutcome::Appended(2));
        let buffer = set.channel(&id("cpu_load")).unwrap().buffer().unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.display_name(), "CPU load");
    }

    #[test]
    fn test_merge_stale_batch_reports_no_new_data() {
        let mut set = two_channel_set();
        set.seed(&id("cpu_load"), "CPU load", samples(&[(100, 5.0)]));
        let outcome = set.merge(&id("cpu_load"), &samples(&[(99, 1.0), (100, 5.0)]));

        assert_eq!(outcome, MergeOutcome::NoNewData);
        assert!(!outcome.did_append());
    }

    #[test]
    fn test_finish_loading_spares_seeded_channels() {
        let mut set = two_channel_set();
        set.seed(&id("cpu_load"), "CPU load", samples(&[(100, 5.0)]));
        set.finish_loading();

        assert!(!set.any_loading());
        // Seeded data survives; only the loading channel was closed out
        assert_eq!(set.total_samples(), 1);
        assert!(set.channel(&id("mem_used")).unwrap().buffer().unwrap().is_empty());
    }

    #[test]
    fn test_reset_loaded_empty() {
        let mut set = two_channel_set();
        set.seed(&id("cpu_load"), "CPU load", samples(&[(100, 5.0)]));
        set.reset_loaded_empty();

        for (_, state) in set.iter() {
            assert!(!state.is_loading());
            assert!(state.buffer().unwrap().is_empty());
        }
        assert_eq!(set.total_samples(), 0);
    }

    #[test]
    fn test_total_samples() {
        let mut set = two_channel_set();
        set.seed(&id("cpu_load"), "CPU load", samples(&[(100, 1.0), (101, 2.0)]));
        set.merge(&id("mem_used"), &samples(&[(100, 3.0)]));

        assert_eq!(set.total_samples(), 3);
    }
}
