//! The stream coordinator
//!
//! Owns the selection epoch, runs the historical fetch for each selection,
//! arms either the poll loop or the live merger from the first response,
//! and exposes the current [`MetricSet`] to the UI layer.
//!
//! Every asynchronous step captures the epoch it was started under and
//! re-checks it before committing results; cancellation tokens abort
//! in-flight work early, but the epoch comparison is what guarantees a
//! stale result can never touch a newer selection's data.

mod live;
mod poll;
mod state;
mod stats;

pub use state::FeedState;
pub use stats::{CoordinatorStats, StatsSnapshot};

use crate::config::{Config, CoordinatorConfig, FeedMode};
use crate::series::{MergeOutcome, MetricSet};
use crate::transport::{
    ChannelBatch, FetchRequest, FetchResponse, MetricEvent, MetricTransport, TimeWindow,
};
use crate::types::{Epoch, Selection};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Coordinates one stream of metric data for whatever the user has selected.
///
/// Constructed once per dashboard surface with its transport collaborator
/// injected; all further interaction goes through [`select_entity`] and the
/// read accessors. Spawns its feed tasks on the ambient tokio runtime, so
/// it must be used from within one.
///
/// [`select_entity`]: StreamCoordinator::select_entity
pub struct StreamCoordinator<T: MetricTransport> {
    transport: Arc<T>,
    config: Arc<Config>,
    shared: Arc<Shared>,
}

/// State shared between the coordinator handle and its spawned feed tasks
struct Shared {
    feed: Mutex<FeedShared>,
    render_tx: watch::Sender<u64>,
    stats: CoordinatorStats,
}

struct FeedShared {
    epoch: Epoch,
    state: FeedState,
    set: MetricSet,
    selection: Option<Selection>,
    cancel: CancellationToken,
}

/// What the seed commit armed for the rest of the epoch
#[derive(Debug, PartialEq)]
enum ArmDecision {
    /// Enter the poll loop starting after this cursor
    Poll { cursor: u64 },
    /// Open the push subscription
    Live,
    /// Nothing to arm (forced polling with no pending data)
    Nothing,
}

/// Outcome of committing a historical fetch response
#[derive(Debug, PartialEq)]
enum SeedCommit {
    /// The epoch moved on; the response was discarded untouched
    Stale,
    /// Seeded; continue with the armed feed
    Armed(ArmDecision),
}

/// Outcome of committing one poll response
#[derive(Debug, PartialEq)]
enum PollCommit {
    /// The epoch moved on; stop polling
    Stale,
    /// More data may exist; poll again after this cursor
    Continue { cursor: u64 },
    /// Upstream reported nothing further pending; stop silently
    Drained,
}

impl<T: MetricTransport> StreamCoordinator<T> {
    /// Create a coordinator with its transport collaborator
    #[must_use]
    pub fn new(transport: T, config: Config) -> Self {
        let (render_tx, _) = watch::channel(0);
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            shared: Arc::new(Shared {
                feed: Mutex::new(FeedShared {
                    epoch: Epoch::INITIAL,
                    state: FeedState::Idle,
                    set: MetricSet::default(),
                    selection: None,
                    cancel: CancellationToken::new(),
                }),
                render_tx,
                stats: CoordinatorStats::new(),
            }),
        }
    }

    /// Switch to a new (entity, tab) selection.
    ///
    /// Bumps the epoch, aborts whatever the previous epoch still had in
    /// flight, replaces the MetricSet with a fresh one from the selection's
    /// catalogue, and schedules the historical fetch after the settle
    /// delay. Rapid successive calls coalesce: only the last selection in
    /// the window actually fetches.
    pub fn select_entity(&self, selection: Selection) {
        let (epoch, token) = {
            let mut feed = self.shared.feed();
            // Best-effort abort of the superseded epoch's work; the epoch
            // comparison below is what actually protects the data.
            feed.cancel.cancel();
            feed.epoch = feed.epoch.next();
            feed.cancel = CancellationToken::new();
            feed.set = MetricSet::create_empty(
                self.config
                    .channels_for(&selection)
                    .iter()
                    .map(|spec| (spec.id.clone(), spec.label.clone())),
            );
            feed.selection = Some(selection.clone());
            feed.transition(FeedState::Fetching);
            (feed.epoch, feed.cancel.clone())
        };

        self.shared.stats.record_selection();
        self.shared.notify_render();
        info!(%selection, %epoch, "selection changed");

        let shared = Arc::clone(&self.shared);
        let transport = Arc::clone(&self.transport);
        let settings = self.config.coordinator.clone();
        tokio::spawn(async move {
            run_epoch(shared, transport, settings, selection, epoch, token).await;
        });
    }

    /// Stop all feed activity; the coordinator stays readable
    pub fn shutdown(&self) {
        let mut feed = self.shared.feed();
        feed.cancel.cancel();
        feed.transition(FeedState::Cancelled);
        info!(epoch = %feed.epoch, "coordinator shut down");
    }

    /// Snapshot of the current MetricSet
    #[must_use]
    pub fn metrics(&self) -> MetricSet {
        self.shared.feed().set.clone()
    }

    /// Current feed lifecycle state
    #[must_use]
    pub fn feed_state(&self) -> FeedState {
        self.shared.feed().state
    }

    /// Current selection epoch
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.shared.feed().epoch
    }

    /// The active selection, if any
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.shared.feed().selection.clone()
    }

    /// Subscribe to render notifications.
    ///
    /// The value is a generation counter bumped whenever the visible data
    /// changed (set replaced, seed committed, samples appended, or an error
    /// reset); consumers re-read [`metrics`] when it moves.
    ///
    /// [`metrics`]: StreamCoordinator::metrics
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.render_tx.subscribe()
    }

    /// Activity counters
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl FeedShared {
    /// Move to a new lifecycle state, logging unexpected edges.
    ///
    /// An invalid edge is a logic bug but never worth crashing the console
    /// over; the feed degrades, the UI keeps rendering.
    fn transition(&mut self, target: FeedState) {
        if !self.state.can_transition_to(target) {
            warn!(from = %self.state, to = %target, "unexpected feed state transition");
        }
        debug!(from = %self.state, to = %target, epoch = %self.epoch, "feed state");
        self.state = target;
    }
}

impl Shared {
    fn feed(&self) -> MutexGuard<'_, FeedShared> {
        self.feed.lock().expect("feed state lock poisoned")
    }

    fn notify_render(&self) {
        self.render_tx.send_modify(|generation| {
            *generation = generation.wrapping_add(1);
        });
    }

    fn is_current(&self, epoch: Epoch) -> bool {
        self.feed().epoch == epoch
    }

    /// Merge one batch, tracking counters; returns whether samples landed
    fn merge_batch(&self, feed: &mut FeedShared, batch: &ChannelBatch) -> bool {
        match feed.set.merge(&batch.id, &batch.samples) {
            MergeOutcome::Appended(count) => {
                self.stats.record_merge(count);
                true
            }
            MergeOutcome::NoNewData => {
                self.stats.record_merge(0);
                false
            }
            MergeOutcome::UnknownChannel => {
                self.stats.record_unknown_channel();
                false
            }
        }
    }

    /// Commit a historical fetch response, if the epoch still matches.
    ///
    /// Seeds every returned channel, closes out channels the response did
    /// not mention, and decides how the rest of the epoch is fed.
    fn commit_seed(&self, epoch: Epoch, response: FetchResponse, mode: FeedMode) -> SeedCommit {
        let mut feed = self.feed();
        if feed.epoch != epoch {
            self.stats.record_stale_result();
            debug!(stale = %epoch, current = %feed.epoch, "discarding stale historical fetch");
            return SeedCommit::Stale;
        }

        for batch in &response.channels {
            if !feed.set.seed(&batch.id, &batch.name, batch.samples.clone()) {
                self.stats.record_unknown_channel();
            }
        }
        feed.set.finish_loading();

        // Chosen once per epoch from the first response's hint (modulo a
        // forced mode), and never switched mid-session
        let decision = if response.more && mode.allows_polling() {
            ArmDecision::Poll {
                cursor: response.cursor,
            }
        } else if mode.allows_live() {
            ArmDecision::Live
        } else {
            ArmDecision::Nothing
        };

        match decision {
            ArmDecision::Poll { .. } => feed.transition(FeedState::Polling),
            ArmDecision::Live => feed.transition(FeedState::Live),
            ArmDecision::Nothing => {
                feed.transition(FeedState::Polling);
                feed.transition(FeedState::Drained);
            }
        }
        drop(feed);

        self.notify_render();
        SeedCommit::Armed(decision)
    }

    /// Commit one poll response, if the epoch still matches
    fn commit_poll(&self, epoch: Epoch, response: FetchResponse) -> PollCommit {
        let mut feed = self.feed();
        if feed.epoch != epoch {
            self.stats.record_stale_result();
            debug!(stale = %epoch, current = %feed.epoch, "discarding stale poll response");
            return PollCommit::Stale;
        }

        let mut appended = false;
        for batch in &response.channels {
            appended |= self.merge_batch(&mut feed, batch);
        }

        let commit = if response.more {
            PollCommit::Continue {
                cursor: response.cursor,
            }
        } else {
            feed.transition(FeedState::Drained);
            PollCommit::Drained
        };
        drop(feed);

        if appended {
            self.notify_render();
        }
        commit
    }

    /// Commit one live event; returns false when the epoch moved on
    fn commit_live_event(&self, epoch: Epoch, event: &MetricEvent) -> bool {
        let mut feed = self.feed();
        if feed.epoch != epoch {
            self.stats.record_stale_result();
            debug!(stale = %epoch, current = %feed.epoch, "ignoring live event for superseded epoch");
            return false;
        }

        let mut appended = false;
        for batch in &event.channels {
            appended |= self.merge_batch(&mut feed, batch);
        }
        drop(feed);

        if appended {
            self.notify_render();
        }
        true
    }

    /// Reset after a transport failure, if the epoch still matches.
    ///
    /// Affected channels land in "loaded, empty" so the UI renders a
    /// neutral state instead of spinning; no retry is scheduled.
    fn commit_error(&self, epoch: Epoch) {
        let mut feed = self.feed();
        if feed.epoch != epoch {
            self.stats.record_stale_result();
            return;
        }
        feed.set.reset_loaded_empty();
        feed.transition(FeedState::Idle);
        drop(feed);

        self.notify_render();
    }
}

/// Run one epoch: settle, fetch, seed, then feed via poll or subscription
async fn run_epoch<T: MetricTransport>(
    shared: Arc<Shared>,
    transport: Arc<T>,
    settings: CoordinatorConfig,
    selection: Selection,
    epoch: Epoch,
    token: CancellationToken,
) {
    // Settle delay: in a burst of selection changes every superseded
    // epoch's token is already cancelled, so only the last one fetches.
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(settings.settle_delay()) => {}
    }

    let now = unix_now();
    let from = now.saturating_sub(settings.window_seconds);
    let request = FetchRequest {
        selection: selection.clone(),
        window: TimeWindow::bounded(from, now, settings.step_seconds),
    };

    shared.stats.record_fetch_issued();
    debug!(%epoch, from, to = now, "issuing historical fetch");

    let result = tokio::select! {
        // Aborted fetches deliver nothing: cancellation is a normal no-op
        _ = token.cancelled() => return,
        result = transport.fetch_metrics(&request) => result,
    };

    let response = match result {
        Ok(response) => response,
        // A transport-level cancellation is a normal no-op, not a failure
        Err(err) if err.is_cancelled() => return,
        Err(err) => {
            shared.stats.record_fetch_failed();
            warn!(%epoch, error = %err, "historical fetch failed; resetting channels");
            shared.commit_error(epoch);
            return;
        }
    };

    match shared.commit_seed(epoch, response, settings.feed_mode) {
        SeedCommit::Stale | SeedCommit::Armed(ArmDecision::Nothing) => {}
        SeedCommit::Armed(ArmDecision::Poll { cursor }) => {
            poll::run_poll_loop(shared, transport, settings, selection, epoch, token, cursor)
                .await;
        }
        SeedCommit::Armed(ArmDecision::Live) => {
            live::run_live_merger(shared, transport, selection, epoch, token).await;
        }
    }
}

/// Current unix time in seconds
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
