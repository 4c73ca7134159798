//! Live merger behavior: event merging, epoch scoping, subscription release


use metric_stream::{FeedState, ScriptedFetch, SimTransport, StreamCoordinator};
use test_helpers::*;

fn live_seed(cursor: u64) -> ScriptedFetch {
    ScriptedFetch::Respond(response(
        vec![batch("cpu_load", &[(cursor - 10, 1.0), (cursor, 2.0)])],
        false,
        cursor,
    ))
}

async fn armed_live(
    sim: &SimTransport,
    coordinator: &StreamCoordinator<SimTransport>,
    entity: &str,
    expected_subscribes: usize,
) {
    coordinator.select_entity(selection(entity, "overview"));
    wait_until("live armed", || coordinator.feed_state() == FeedState::Live).await;
    wait_until("subscription open", || {
        sim.subscribe_count() == expected_subscribes && sim.active_subscriptions() == 1
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_live_events_merge_strictly_newer() {
    let sim = SimTransport::new();
    sim.push_fetch(live_seed(100));

    let coordinator = StreamCoordinator::new(sim.clone(), config_no_settle());
    armed_live(&sim, &coordinator, "ap-1", 1).await;

    // A strictly newer event lands
    assert!(sim.push_event(event(vec![batch("cpu_load", &[(110, 3.0)])])));
    wait_until("event merged", || coordinator.metrics().total_samples() == 3).await;

    // An event at or before the tail does not
    assert!(sim.push_event(event(vec![batch("cpu_load", &[(110, 3.0), (100, 2.0)])])));
    wait_until("event processed", || coordinator.stats().live_events == 2).await;
    assert_eq!(coordinator.metrics().total_samples(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_render_notification_only_when_samples_land() {
    let sim = SimTransport::new();
    sim.push_fetch(live_seed(100));

    let coordinator = StreamCoordinator::new(sim.clone(), config_no_settle());
    let changes = coordinator.changes();
    armed_live(&sim, &coordinator, "ap-1", 1).await;
    let after_seed = *changes.borrow();

    // Stale event: processed but not rendered
    sim.push_event(event(vec![batch("cpu_load", &[(100, 2.0)])]));
    wait_until("event processed", || coordinator.stats().live_events == 1).await;
    assert_eq!(*changes.borrow(), after_seed);

    // Fresh event: rendered
    sim.push_event(event(vec![batch("cpu_load", &[(120, 4.0)])]));
    wait_until("event rendered", || *changes.borrow() > after_seed).await;
}

#[tokio::test(start_paused = true)]
async fn test_reselection_releases_subscription_exactly_once() {
    let sim = SimTransport::new();
    sim.push_fetch(live_seed(100));
    sim.push_fetch(live_seed(200));

    let coordinator = StreamCoordinator::new(sim.clone(), config_no_settle());
    armed_live(&sim, &coordinator, "ap-A", 1).await;

    // Switching selections closes A's subscription and opens B's:
    // one subscription active at a time, no dangling handles
    armed_live(&sim, &coordinator, "ap-B", 2).await;
    assert_eq!(sim.subscribe_count(), 2);
    assert_eq!(sim.active_subscriptions(), 1);

    // Events now land in B's buffers
    sim.push_event(event(vec![batch("cpu_load", &[(210, 5.0)])]));
    wait_until("event merged into B", || {
        coordinator.metrics().total_samples() == 3
    })
    .await;
    let metrics = coordinator.metrics();
    let cpu = metrics.channel(&channel_id("cpu_load")).unwrap();
    assert_eq!(cpu.buffer().unwrap().last_timestamp(), Some(210));
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_failure_resets_channels() {
    let sim = SimTransport::new();
    sim.push_fetch(live_seed(100));
    sim.fail_next_subscribe(true);

    let coordinator = StreamCoordinator::new(sim.clone(), config_no_settle());
    coordinator.select_entity(selection("ap-1", "overview"));

    wait_until("error reset", || {
        coordinator.feed_state() == FeedState::Idle
    })
    .await;
    let metrics = coordinator.metrics();
    assert!(!metrics.any_loading());
    assert_eq!(metrics.total_samples(), 0);
    assert_eq!(sim.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_closing_feed_is_silent() {
    let sim = SimTransport::new();
    sim.push_fetch(live_seed(100));

    let coordinator = StreamCoordinator::new(sim.clone(), config_no_settle());
    armed_live(&sim, &coordinator, "ap-1", 1).await;

    // The upstream goes away: the merger ends its task and releases the
    // subscription handle, with no error surfacing anywhere
    sim.close_feed();
    wait_until("subscription released", || sim.active_subscriptions() == 0).await;

    // The coordinator carried on; data intact and still readable
    assert_eq!(coordinator.metrics().total_samples(), 2);
    assert_eq!(coordinator.feed_state(), FeedState::Live);
}
