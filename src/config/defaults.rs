//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde
//! deserialization.

/// Default settle delay after a selection change (milliseconds)
#[inline]
pub fn settle_delay_ms() -> u64 {
    500
}

/// Default historical seed window (1 hour)
#[inline]
pub fn window_seconds() -> u64 {
    3600
}

/// Default worker thread count (the coordinator is cooperative)
#[inline]
pub fn threads() -> usize {
    1
}
