//! Simulated metric transport
//!
//! An in-memory [`MetricTransport`] used by unit tests, integration tests
//! and the `metric-stream-sim` binary. Fetches are served from a script of
//! canned outcomes; once the script runs dry the transport either generates
//! a deterministic synthetic waveform (sim binary) or returns an empty
//! response (tests). Every request is recorded for inspection.

use super::{
    ChannelBatch, FetchRequest, FetchResponse, MetricEvent, MetricSubscription, MetricTransport,
};
use crate::feed_error::FeedError;
use crate::series::Sample;
use crate::types::{ChannelId, Selection};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One scripted outcome for a fetch call
#[derive(Debug, Clone)]
pub enum ScriptedFetch {
    /// Resolve immediately with this response
    Respond(FetchResponse),
    /// Resolve with this response after a delay
    RespondAfter(Duration, FetchResponse),
    /// Fail with a transport error carrying this message
    Fail(String),
    /// Report the call as cancelled at the transport layer
    Cancelled,
    /// Never resolve; only cancellation (dropping the future) ends the call
    Hang,
}

/// Simulated upstream metric services
#[derive(Clone)]
pub struct SimTransport {
    inner: Arc<SimInner>,
}

struct SimInner {
    script: Mutex<VecDeque<ScriptedFetch>>,
    requests: Mutex<Vec<FetchRequest>>,
    fetches: AtomicUsize,
    subscribes: AtomicUsize,
    active_subscriptions: AtomicUsize,
    event_tx: Mutex<Option<(usize, mpsc::Sender<MetricEvent>)>>,
    fail_subscribe: AtomicBool,
    event_buffer: usize,
    synth_channels: Vec<(ChannelId, String)>,
}

impl SimTransport {
    /// Create a transport with an empty script; unscripted fetches return
    /// empty responses with `more = false`
    #[must_use]
    pub fn new() -> Self {
        Self::with_channels(Vec::new())
    }

    /// Create a transport that synthesizes a deterministic waveform for the
    /// given channels whenever the script is empty
    #[must_use]
    pub fn synthetic(channels: Vec<(ChannelId, String)>) -> Self {
        Self::with_channels(channels)
    }

    fn with_channels(synth_channels: Vec<(ChannelId, String)>) -> Self {
        Self {
            inner: Arc::new(SimInner {
                script: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                fetches: AtomicUsize::new(0),
                subscribes: AtomicUsize::new(0),
                active_subscriptions: AtomicUsize::new(0),
                event_tx: Mutex::new(None),
                fail_subscribe: AtomicBool::new(false),
                event_buffer: 32,
                synth_channels,
            }),
        }
    }

    /// Queue a scripted outcome for the next unconsumed fetch
    pub fn push_fetch(&self, scripted: ScriptedFetch) {
        self.inner
            .script
            .lock()
            .expect("script lock poisoned")
            .push_back(scripted);
    }

    /// Make future `subscribe_metrics` calls fail with a transport error
    pub fn fail_next_subscribe(&self, fail: bool) {
        self.inner.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Push an event into the currently active subscription.
    ///
    /// Returns false if no subscription is active (or its buffer is full) —
    /// the event is lost, as it would be upstream.
    pub fn push_event(&self, event: MetricEvent) -> bool {
        let guard = self.inner.event_tx.lock().expect("event_tx lock poisoned");
        match guard.as_ref() {
            Some((_, tx)) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Simulate the upstream closing the push feed: the subscriber's event
    /// stream ends (as if the service went away)
    pub fn close_feed(&self) {
        let mut guard = self.inner.event_tx.lock().expect("event_tx lock poisoned");
        *guard = None;
    }

    /// Number of fetch calls observed
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Number of subscribe calls observed
    #[must_use]
    pub fn subscribe_count(&self) -> usize {
        self.inner.subscribes.load(Ordering::SeqCst)
    }

    /// Number of subscriptions currently held open by callers
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.inner.active_subscriptions.load(Ordering::SeqCst)
    }

    /// Every fetch request observed so far, in call order
    #[must_use]
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.inner
            .requests
            .lock()
            .expect("requests lock poisoned")
            .clone()
    }

    /// Deterministic waveform response covering the requested window
    fn synthesize(&self, request: &FetchRequest) -> FetchResponse {
        let from = request.window.from;
        let to = request.window.to.unwrap_or(from);
        let step = request.window.step.get();

        let channels = self
            .inner
            .synth_channels
            .iter()
            .enumerate()
            .map(|(index, (id, name))| {
                let mut samples = Vec::new();
                let mut t = from;
                while t <= to {
                    samples.push(Sample::new(t, waveform(index, t)));
                    t += step;
                }
                ChannelBatch::new(id.clone(), name.clone(), samples)
            })
            .collect();

        FetchResponse {
            channels,
            more: false,
            cursor: to,
        }
    }
}

impl Default for SimTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Synthetic per-channel waveform: a slow sine offset by channel index
fn waveform(channel_index: usize, timestamp: u64) -> f64 {
    let phase = (timestamp as f64) * 0.05 + channel_index as f64;
    50.0 + 10.0 * phase.sin() + 5.0 * channel_index as f64
}

#[async_trait]
impl MetricTransport for SimTransport {
    async fn fetch_metrics(&self, request: &FetchRequest) -> Result<FetchResponse, FeedError> {
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner
            .requests
            .lock()
            .expect("requests lock poisoned")
            .push(request.clone());

        let scripted = self
            .inner
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front();

        match scripted {
            Some(ScriptedFetch::Respond(response)) => Ok(response),
            Some(ScriptedFetch::RespondAfter(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(ScriptedFetch::Fail(message)) => {
                Err(FeedError::transport_msg("fetch", message))
            }
            Some(ScriptedFetch::Cancelled) => Err(FeedError::Cancelled),
            Some(ScriptedFetch::Hang) => {
                // Pending forever; the caller cancels by dropping the future
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            None if !self.inner.synth_channels.is_empty() => Ok(self.synthesize(request)),
            None => Ok(FetchResponse {
                channels: Vec::new(),
                more: false,
                cursor: request.window.to.unwrap_or(request.window.from),
            }),
        }
    }

    async fn subscribe_metrics(
        &self,
        selection: &Selection,
    ) -> Result<MetricSubscription, FeedError> {
        self.inner.subscribes.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail_subscribe.load(Ordering::SeqCst) {
            return Err(FeedError::transport_msg("subscribe", "subscribe refused"));
        }

        debug!(%selection, "sim transport: opening subscription");

        let subscription_id = self.inner.subscribes.load(Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.inner.event_buffer);
        {
            let mut guard = self.inner.event_tx.lock().expect("event_tx lock poisoned");
            // A new subscription replaces the previous pipe; the upstream
            // pushes to one subscriber at a time
            *guard = Some((subscription_id, tx));
        }
        self.inner
            .active_subscriptions
            .fetch_add(1, Ordering::SeqCst);

        // Observe the subscription handle being dropped so the active count
        // and the event pipe reflect exactly-once release.
        let token = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let released = token.clone();
        tokio::spawn(async move {
            released.cancelled().await;
            inner.active_subscriptions.fetch_sub(1, Ordering::SeqCst);
            let mut guard = inner.event_tx.lock().expect("event_tx lock poisoned");
            if matches!(guard.as_ref(), Some((current, _)) if *current == subscription_id) {
                *guard = None;
            }
        });

        Ok(MetricSubscription::with_release(rx, token.drop_guard()))
    }
}
