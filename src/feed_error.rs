//! Error types for the metric feed
//!
//! Every failure in this subsystem degrades to "no data for this channel";
//! there is no fatal class. The taxonomy exists so callers can tell a
//! transport failure (reset channels, keep going) from a cancellation
//! (normal no-op) from an unknown-channel batch (dropped silently).

use crate::types::ChannelId;
use thiserror::Error;

/// Errors produced while fetching or merging metric data
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedError {
    /// Network or upstream-service failure during a fetch or subscribe
    #[error("transport failure during {operation}: {source}")]
    Transport {
        /// Which operation failed ("historical fetch", "poll", "subscribe")
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The operation was superseded by a newer selection
    #[error("superseded by a newer selection")]
    Cancelled,

    /// A batch referenced a channel outside the current catalogue
    #[error("channel '{0}' is not in the current catalogue")]
    UnknownChannel(ChannelId),
}

impl FeedError {
    /// Build a transport error from any error value
    pub fn transport(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            operation,
            source: source.into(),
        }
    }

    /// Build a transport error from a plain message
    #[must_use]
    pub fn transport_msg(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            source: message.into().into(),
        }
    }

    /// Check if this is a cancellation (normal no-op, never surfaced)
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a transport failure
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Get the appropriate log level for this error
    ///
    /// Cancellations and unknown channels are routine; only transport
    /// failures warrant operator attention.
    #[must_use]
    pub const fn log_level(&self) -> tracing::Level {
        match self {
            Self::Transport { .. } => tracing::Level::WARN,
            Self::Cancelled | Self::UnknownChannel(_) => tracing::Level::DEBUG,
        }
    }
}
