//! Benchmarks for the series hot path
//!
//! Measures the operations the feed tasks run on every batch:
//! - ChannelBuffer::merge for pre-sorted and unsorted batches
//! - ChannelBuffer::seeded normalization
//! - MetricSet::merge dispatch
//!
//! Run with: cargo bench --bench series_merge

use divan::{Bencher, black_box};
use metric_stream::{ChannelBuffer, ChannelId, MetricSet, Sample};

fn main() {
    divan::main();
}

fn channel() -> ChannelId {
    ChannelId::new("cpu_load").unwrap()
}

/// A strictly increasing sample run starting at `from`
fn run(from: u64, len: usize) -> Vec<Sample> {
    (0..len as u64)
        .map(|i| Sample::new(from + i, (i % 97) as f64))
        .collect()
}

// =============================================================================
// ChannelBuffer::merge
// =============================================================================

mod merge {
    use super::*;

    #[divan::bench(args = [100, 10_000])]
    fn append_all_newer(bencher: Bencher, len: usize) {
        let seed = run(0, 1_000);
        let batch = run(1_000, len);
        bencher
            .with_inputs(|| ChannelBuffer::seeded(channel(), "CPU", seed.clone()))
            .bench_local_values(|mut buffer| {
                black_box(buffer.merge(black_box(&batch)));
                buffer
            });
    }

    #[divan::bench(args = [100, 10_000])]
    fn overlap_drops_stale_half(bencher: Bencher, len: usize) {
        let seed = run(0, len);
        // Half the batch overlaps stored data, half is new
        let batch = run(len as u64 / 2, len);
        bencher
            .with_inputs(|| ChannelBuffer::seeded(channel(), "CPU", seed.clone()))
            .bench_local_values(|mut buffer| {
                black_box(buffer.merge(black_box(&batch)));
                buffer
            });
    }

    #[divan::bench(args = [100, 10_000])]
    fn unsorted_batch_normalizes(bencher: Bencher, len: usize) {
        let seed = run(0, 1_000);
        let mut batch = run(1_000, len);
        batch.reverse();
        bencher
            .with_inputs(|| ChannelBuffer::seeded(channel(), "CPU", seed.clone()))
            .bench_local_values(|mut buffer| {
                black_box(buffer.merge(black_box(&batch)));
                buffer
            });
    }

    #[divan::bench(args = [100, 10_000])]
    fn fully_stale_batch(bencher: Bencher, len: usize) {
        let seed = run(0, len);
        let batch = run(0, len / 2);
        bencher
            .with_inputs(|| ChannelBuffer::seeded(channel(), "CPU", seed.clone()))
            .bench_local_values(|mut buffer| {
                black_box(buffer.merge(black_box(&batch)));
                buffer
            });
    }
}

// =============================================================================
// ChannelBuffer::seeded
// =============================================================================

mod seed {
    use super::*;

    #[divan::bench(args = [100, 10_000])]
    fn presorted(bencher: Bencher, len: usize) {
        let batch = run(0, len);
        bencher.bench(|| {
            black_box(ChannelBuffer::seeded(
                channel(),
                "CPU",
                black_box(batch.clone()),
            ))
        });
    }

    #[divan::bench(args = [100, 10_000])]
    fn reversed_with_duplicates(bencher: Bencher, len: usize) {
        let mut batch = run(0, len);
        batch.extend(run(0, len / 4));
        batch.reverse();
        bencher.bench(|| {
            black_box(ChannelBuffer::seeded(
                channel(),
                "CPU",
                black_box(batch.clone()),
            ))
        });
    }
}

// =============================================================================
// MetricSet::merge dispatch
// =============================================================================

mod set {
    use super::*;

    #[divan::bench]
    fn merge_known_channel(bencher: Bencher) {
        let batch = run(1_000, 100);
        bencher
            .with_inputs(|| {
                let mut set = MetricSet::create_empty(vec![(channel(), "CPU")]);
                set.seed(&channel(), "CPU", run(0, 1_000));
                set
            })
            .bench_local_values(|mut set| {
                black_box(set.merge(&channel(), black_box(&batch)));
                set
            });
    }

    #[divan::bench]
    fn merge_unknown_channel(bencher: Bencher) {
        let unknown = ChannelId::new("rf_noise").unwrap();
        let batch = run(1_000, 100);
        bencher
            .with_inputs(|| MetricSet::create_empty(vec![(channel(), "CPU")]))
            .bench_local_values(|mut set| {
                black_box(set.merge(&unknown, black_box(&batch)));
                set
            });
    }
}
