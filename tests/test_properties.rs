//! Property-based tests using proptest
//!
//! These tests verify the series invariants under arbitrary seed/merge
//! interleavings with arbitrary input generation.

use metric_stream::{ChannelBuffer, ChannelId, MetricSet, Sample};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

fn channel() -> ChannelId {
    ChannelId::new("cpu_load").unwrap()
}

fn arb_samples(max_len: usize) -> impl Strategy<Value = Vec<Sample>> {
    prop::collection::vec(
        (0u64..2_000, -1_000.0f64..1_000.0),
        0..max_len,
    )
    .prop_map(|points| {
        points
            .into_iter()
            .map(|(t, v)| Sample::new(t, v))
            .collect()
    })
}

/// Assert the buffer invariant: strictly increasing, unique timestamps
fn check_strictly_increasing(buffer: &ChannelBuffer) -> Result<(), TestCaseError> {
    let timestamps: Vec<u64> = buffer.samples().iter().map(|s| s.timestamp).collect();
    for window in timestamps.windows(2) {
        prop_assert!(
            window[0] < window[1],
            "timestamps not strictly increasing: {:?}",
            timestamps
        );
    }
    Ok(())
}

proptest! {
    // =========================================================================
    // Monotonicity: the invariant holds after every seed/merge sequence
    // =========================================================================

    #[test]
    fn prop_seed_always_strictly_increasing(batch in arb_samples(50)) {
        let buffer = ChannelBuffer::seeded(channel(), "CPU", batch);
        check_strictly_increasing(&buffer)?;
    }

    #[test]
    fn prop_merge_sequence_keeps_invariant(
        seed in arb_samples(30),
        batches in prop::collection::vec(arb_samples(20), 0..8),
    ) {
        let mut buffer = ChannelBuffer::seeded(channel(), "CPU", seed);
        for batch in &batches {
            buffer.merge(batch);
            check_strictly_increasing(&buffer)?;
        }
    }

    // =========================================================================
    // No duplication: re-merging stored data appends nothing
    // =========================================================================

    #[test]
    fn prop_remerge_is_idempotent(seed in arb_samples(40)) {
        let mut buffer = ChannelBuffer::seeded(channel(), "CPU", seed);
        let before: Vec<Sample> = buffer.samples().to_vec();

        let appended = buffer.merge(&before);

        prop_assert_eq!(appended, 0);
        prop_assert_eq!(buffer.samples(), before.as_slice());
    }

    #[test]
    fn prop_merge_never_appends_at_or_before_tail(
        seed in arb_samples(30),
        batch in arb_samples(30),
    ) {
        let mut buffer = ChannelBuffer::seeded(channel(), "CPU", seed);
        let tail = buffer.last_timestamp();

        let appended = buffer.merge(&batch);

        if let Some(tail) = tail {
            let expected: std::collections::BTreeSet<u64> = batch
                .iter()
                .map(|s| s.timestamp)
                .filter(|&t| t > tail)
                .collect();
            prop_assert_eq!(appended, expected.len());
        }
        check_strictly_increasing(&buffer)?;
    }

    #[test]
    fn prop_merge_grows_monotonically(
        seed in arb_samples(30),
        batch in arb_samples(30),
    ) {
        let mut buffer = ChannelBuffer::seeded(channel(), "CPU", seed);
        let len_before = buffer.len();
        let tail_before = buffer.last_timestamp();

        buffer.merge(&batch);

        // Merging never removes or rewrites what was already stored
        prop_assert!(buffer.len() >= len_before);
        if let Some(tail) = tail_before {
            prop_assert!(buffer.last_timestamp().unwrap_or(0) >= tail);
        }
    }

    // =========================================================================
    // MetricSet: unknown channels never materialize
    // =========================================================================

    #[test]
    fn prop_unknown_channel_never_materializes(batches in prop::collection::vec(arb_samples(10), 0..5)) {
        let mut set = MetricSet::create_empty(vec![(channel(), "CPU")]);
        let unknown = ChannelId::new("rf_noise").unwrap();

        for batch in &batches {
            let outcome = set.merge(&unknown, batch);
            prop_assert!(!outcome.did_append());
        }
        prop_assert!(set.channel(&unknown).is_none());
        prop_assert_eq!(set.len(), 1);
    }
}
