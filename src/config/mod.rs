//! Configuration module
//!
//! This module handles all configuration types and loading for the metric
//! stream coordinator.

mod defaults;
mod loading;
mod types;
mod validation;

// Re-export public types
pub use loading::{ConfigSource, create_default_config, load_config, load_config_with_fallback};
pub use types::{ChannelSpec, Config, CoordinatorConfig, FeedMode, TabCatalogue};

// Re-export default functions for use in tests and other modules
pub use defaults::{settle_delay_ms, threads, window_seconds};
