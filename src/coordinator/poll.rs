//! The poll loop
//!
//! Re-queries the historical endpoint with an open-ended window starting
//! one second after the previous response's cursor, for as long as the
//! epoch stays current and each response reports more data pending.

use super::{PollCommit, Shared};
use crate::config::CoordinatorConfig;
use crate::transport::{FetchRequest, MetricTransport, TimeWindow};
use crate::types::{Epoch, Selection};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Poll until the upstream drains, an error resets the feed, or the epoch
/// is superseded. Stopping is always silent: none of those outcomes is an
/// error to anyone upstream of the coordinator.
pub(super) async fn run_poll_loop<T: MetricTransport>(
    shared: Arc<Shared>,
    transport: Arc<T>,
    settings: CoordinatorConfig,
    selection: Selection,
    epoch: Epoch,
    token: CancellationToken,
    mut cursor: u64,
) {
    loop {
        // The loop self-terminates by re-checking the epoch before every
        // request, independent of the cancellation token.
        if token.is_cancelled() || !shared.is_current(epoch) {
            return;
        }

        // The cursor names the last second already covered, so the next
        // window starts strictly after it.
        let request = FetchRequest {
            selection: selection.clone(),
            window: TimeWindow::open_ended(cursor + 1, settings.step_seconds),
        };

        shared.stats.record_poll_cycle();
        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = transport.fetch_metrics(&request) => result,
        };

        let response = match result {
            Ok(response) => response,
            // A transport-level cancellation ends the loop as a no-op
            Err(err) if err.is_cancelled() => return,
            Err(err) => {
                shared.stats.record_fetch_failed();
                warn!(%epoch, error = %err, "poll cycle failed; resetting channels");
                shared.commit_error(epoch);
                return;
            }
        };

        match shared.commit_poll(epoch, response) {
            PollCommit::Stale => return,
            PollCommit::Drained => {
                debug!(%epoch, cursor, "poll feed drained");
                return;
            }
            PollCommit::Continue { cursor: next } => cursor = next,
        }
    }
}
