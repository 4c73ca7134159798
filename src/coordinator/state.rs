//! Per-epoch feed lifecycle states

/// Lifecycle of the feed for one epoch.
///
/// A new selection restarts the cycle at `Fetching` (under the next epoch);
/// the superseded epoch is terminally `Cancelled`. `Drained` is a Polling
/// epoch whose upstream reported no more pending data — the loop has ended
/// but the epoch is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No selection yet, or feed inactive after an error reset
    Idle,
    /// Historical fetch in flight
    Fetching,
    /// Issuing the next bounded query whenever the previous one resolves
    Polling,
    /// Poll loop ended after the upstream reported no more data
    Drained,
    /// Subscribed to the push feed
    Live,
    /// Superseded by a newer selection (terminal for the epoch)
    Cancelled,
}

impl FeedState {
    /// Check if a transition from this state to `target` is valid
    #[must_use]
    pub const fn can_transition_to(self, target: FeedState) -> bool {
        use FeedState::*;

        matches!(
            (self, target),
            // A new selection restarts from anywhere
            (_, Fetching) |

            // From Fetching: arm a feed, settle into idle on error, or
            // stay idle when the catalogue is empty
            (Fetching, Polling) |
            (Fetching, Live) |
            (Fetching, Idle) |

            // Polling ends by draining or by an error reset
            (Polling, Drained) |
            (Polling, Idle) |

            // Live ends only by supersession or shutdown
            (Live, Idle) |

            // Any state can be superseded or shut down
            (_, Cancelled)
        )
    }

    /// Whether a feed task (fetch, poll, or subscription) is active
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Fetching | Self::Polling | Self::Live)
    }

    /// Get human-readable state name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Fetching => "Fetching",
            Self::Polling => "Polling",
            Self::Drained => "Drained",
            Self::Live => "Live",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for FeedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
