//! Command-line argument parsing for metric-stream binaries
//!
//! Provides shared argument structures to avoid duplication across binaries.

use crate::config::FeedMode;
use clap::Parser;

/// Common command-line arguments for metric-stream binaries
///
/// Use `#[command(flatten)]` in binary-specific Args to include these fields.
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "metric-stream.toml", env = "METRIC_STREAM_CONFIG")]
    pub config: String,

    /// Feed arming mode (overrides config file)
    ///
    /// - auto: decide from the first response's hint
    /// - polling: always poll, never subscribe
    /// - live: always subscribe, never poll
    #[arg(short = 'm', long = "feed-mode", value_enum, env = "METRIC_STREAM_FEED_MODE_ARG")]
    pub feed_mode: Option<FeedMode>,

    /// Number of worker threads (overrides config file; default: 1)
    #[arg(short, long, env = "METRIC_STREAM_THREADS")]
    pub threads: Option<usize>,
}

impl CommonArgs {
    /// Resolve the worker thread count, preferring CLI args over config
    #[must_use]
    pub fn resolve_threads(&self, config: &crate::config::Config) -> usize {
        self.threads.unwrap_or(config.coordinator.threads)
    }

    /// Apply CLI overrides onto a loaded configuration
    pub fn apply_overrides(&self, config: &mut crate::config::Config) {
        if let Some(mode) = self.feed_mode {
            config.coordinator.feed_mode = mode;
        }
    }
}
