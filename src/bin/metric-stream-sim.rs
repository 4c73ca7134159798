//! Simulation harness: runs the coordinator against the simulated transport
//!
//! Useful for eyeballing coordinator behavior (seeding, live merging,
//! selection changes) without the real upstream services. The simulated
//! backend serves a deterministic waveform for the configured catalogue and
//! pushes one live event per interval.

use anyhow::Result;
use clap::Parser;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

use metric_stream::args::CommonArgs;
use metric_stream::runtime::{RuntimeConfig, load_and_log_config, shutdown_signal};
use metric_stream::{
    ChannelBatch, EntityId, EntityKind, MetricEvent, Sample, Selection, SimTransport,
    StreamCoordinator, TabId,
};

#[derive(Parser, Debug)]
#[command(name = "metric-stream-sim")]
#[command(about = "Run the stream coordinator against a simulated metric backend")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Entity id to select at startup
    #[arg(long, default_value = "ap-0001")]
    entity: String,

    /// Dashboard tab to select at startup
    #[arg(long, default_value = "overview")]
    tab: String,

    /// Seconds between simulated live events
    #[arg(long, default_value_t = 1)]
    event_interval: u64,

    /// Seconds between snapshot log lines
    #[arg(long, default_value_t = 10)]
    snapshot_interval: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    metric_stream::logging::init_dual_logging();

    let (mut config, _source) = load_and_log_config(&args.common.config)?;
    args.common.apply_overrides(&mut config);

    let threads = args.common.resolve_threads(&config);
    let rt = RuntimeConfig::from_args(Some(threads)).build_runtime()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: metric_stream::Config) -> Result<()> {
    let selection = Selection::new(
        EntityId::new(args.entity.clone())?,
        EntityKind::AccessPoint,
        TabId::new(args.tab.clone())?,
    );

    let channels: Vec<_> = config
        .channels_for(&selection)
        .iter()
        .map(|spec| (spec.id.clone(), spec.label.clone()))
        .collect();
    if channels.is_empty() {
        anyhow::bail!(
            "tab '{}' declares no channels for {}; check the catalogue",
            args.tab,
            selection.kind
        );
    }

    let transport = SimTransport::synthetic(channels.clone());
    let pusher = transport.clone();

    let coordinator = StreamCoordinator::new(transport, config);
    coordinator.select_entity(selection);

    // Simulated upstream: one live event per interval across all channels
    let event_channels = channels;
    let event_interval = args.event_interval.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(event_interval));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let now = unix_now();
            let event = MetricEvent {
                channels: event_channels
                    .iter()
                    .enumerate()
                    .map(|(index, (id, name))| {
                        ChannelBatch::new(
                            id.clone(),
                            name.clone(),
                            vec![Sample::new(now, 50.0 + (index as f64) * 5.0)],
                        )
                    })
                    .collect(),
            };
            pusher.push_event(event);
        }
    });

    // Periodic snapshot so the log shows the feed making progress
    let changes = coordinator.changes();
    tokio::spawn({
        let snapshot_interval = args.snapshot_interval.max(1);
        let mut changes = changes;
        async move {
            let mut interval = tokio::time::interval(Duration::from_secs(snapshot_interval));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let generation = *changes.borrow_and_update();
                info!(generation, "render generation");
            }
        }
    });

    shutdown_signal().await;
    info!("Shutdown signal received");

    coordinator.shutdown();
    let stats = coordinator.stats();
    info!(
        fetches = stats.fetches_issued,
        live_events = stats.live_events,
        samples = stats.samples_appended,
        stale_discarded = stats.stale_results_discarded,
        "final coordinator stats"
    );
    let metrics = coordinator.metrics();
    info!(
        channels = metrics.len(),
        samples = metrics.total_samples(),
        state = %coordinator.feed_state(),
        "final metric set"
    );

    Ok(())
}

/// Current unix time in seconds
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
