//! The live merger
//!
//! Holds the push-feed subscription for one epoch and merges inbound
//! events under the same dedup rule as polling. The subscription handle
//! lives on this task's stack, so superseding the epoch cancels the task
//! and releases the subscription exactly once — no dangling subscriptions
//! survive a selection change.

use super::Shared;
use crate::transport::MetricTransport;
use crate::types::{Epoch, Selection};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Subscribe and merge events until the epoch ends or the feed closes
pub(super) async fn run_live_merger<T: MetricTransport>(
    shared: Arc<Shared>,
    transport: Arc<T>,
    selection: Selection,
    epoch: Epoch,
    token: CancellationToken,
) {
    let mut subscription = tokio::select! {
        _ = token.cancelled() => return,
        result = transport.subscribe_metrics(&selection) => match result {
            Ok(subscription) => subscription,
            Err(err) if err.is_cancelled() => return,
            Err(err) => {
                shared.stats.record_fetch_failed();
                warn!(%epoch, error = %err, "subscribe failed; resetting channels");
                shared.commit_error(epoch);
                return;
            }
        }
    };

    debug!(%epoch, %selection, "live subscription open");

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            event = subscription.next_event() => match event {
                None => {
                    debug!(%epoch, "live feed closed upstream");
                    break;
                }
                Some(event) => {
                    shared.stats.record_live_event();
                    if !shared.commit_live_event(epoch, &event) {
                        break;
                    }
                }
            }
        }
    }
    // `subscription` drops here, releasing it upstream exactly once
}
