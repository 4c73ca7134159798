//! Core identifier and selection types
//!
//! This module provides the validated identifiers and the selection/epoch
//! types used throughout the coordinator.

pub mod validated;

pub use validated::{ChannelId, EntityId, StepSeconds, TabId, ValidationError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of network entity a selection points at
///
/// Different kinds expose different channel catalogues; a tab that makes
/// sense for an access point may not exist for a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// A single small-cell access point
    AccessPoint,
    /// A site gateway aggregating several access points
    Gateway,
    /// A whole site (logical grouping)
    Site,
}

impl EntityKind {
    /// Get a human-readable name for this kind
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccessPoint => "access-point",
            Self::Gateway => "gateway",
            Self::Site => "site",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (entity, tab) triple that determines which channel catalogue and
/// which upstream queries apply.
///
/// A selection is created when the user picks a new node or tab and is
/// superseded, never mutated, on the next change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// The monitored entity
    pub entity_id: EntityId,
    /// What kind of entity it is
    pub kind: EntityKind,
    /// The dashboard tab being viewed
    pub tab: TabId,
}

impl Selection {
    /// Create a new selection
    #[must_use]
    pub fn new(entity_id: EntityId, kind: EntityKind, tab: TabId) -> Self {
        Self {
            entity_id,
            kind,
            tab,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.entity_id, self.tab, self.kind)
    }
}

/// Monotonically increasing token identifying the current selection.
///
/// Every asynchronous operation captures the epoch active at its start and
/// re-checks it before committing results; a mismatch means the result
/// belongs to a superseded selection and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// The epoch before any selection has been made
    pub const INITIAL: Self = Self(0);

    /// The epoch following this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value, for logging
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
