//! Tokio runtime configuration and common utilities for binary targets
//!
//! This module provides:
//! - Testable runtime configuration and builder logic
//! - Shutdown signal handling

use anyhow::Result;

/// Runtime configuration
///
/// The coordinator is cooperative and event-driven; a single worker thread
/// is the default and usually all it needs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads
    worker_threads: usize,
}

impl RuntimeConfig {
    /// Create runtime config from an optional thread count
    ///
    /// If `threads` is None or Some(0), defaults to 1 thread.
    /// A single-threaded runtime is used if threads == 1.
    #[must_use]
    pub fn from_args(threads: Option<usize>) -> Self {
        let worker_threads = match threads {
            None | Some(0) => 1,
            Some(n) => n,
        };

        Self { worker_threads }
    }

    /// Get number of worker threads
    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Check if single-threaded
    #[must_use]
    pub const fn is_single_threaded(&self) -> bool {
        self.worker_threads == 1
    }

    /// Build the tokio runtime
    ///
    /// Creates either a current-thread or multi-threaded runtime based on
    /// the configured worker thread count.
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = if self.is_single_threaded() {
            tracing::info!("Starting metric stream with single-threaded runtime");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            tracing::info!(
                "Starting metric stream with {} worker threads",
                self.worker_threads
            );
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .enable_all()
                .build()?
        };

        Ok(rt)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_args(None)
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
///
/// This is a common utility for all binary targets.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Load configuration and log catalogue information
///
/// Common pattern across binary targets - load config and display the
/// catalogue the coordinator will serve.
///
/// # Errors
/// Returns error if configuration loading fails
pub fn load_and_log_config(
    config_path: &str,
) -> Result<(crate::config::Config, crate::config::ConfigSource)> {
    use crate::config::load_config_with_fallback;
    use tracing::info;

    let (config, source) = load_config_with_fallback(config_path)?;

    info!("Loaded configuration from {}", source.description());
    info!("Loaded {} tab catalogue(s):", config.catalogue.len());
    for entry in &config.catalogue {
        info!(
            "  - {} ({} channels{})",
            entry.tab,
            entry.channels.len(),
            entry
                .entity_kind
                .map(|kind| format!(", {kind} only"))
                .unwrap_or_default()
        );
    }

    Ok((config, source))
}
