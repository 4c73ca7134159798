//! Configuration loading from files and environment variables
//!
//! This module handles loading configuration from TOML files and environment
//! variables, with environment variables taking precedence for container
//! deployments.

use anyhow::Result;

use super::types::{ChannelSpec, Config, TabCatalogue};
use crate::types::{ChannelId, TabId};

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from the given file path
    File(String),
    /// Built-in defaults (no config file found)
    Defaults,
}

impl ConfigSource {
    /// Human-readable description for startup logging
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::File(path) => format!("config file '{}'", path),
            Self::Defaults => "built-in defaults".to_string(),
        }
    }
}

/// Apply environment variable overrides to coordinator settings
///
/// Supported variables:
/// - `METRIC_STREAM_SETTLE_DELAY_MS`
/// - `METRIC_STREAM_WINDOW_SECONDS`
/// - `METRIC_STREAM_STEP_SECONDS`
/// - `METRIC_STREAM_FEED_MODE` (`auto` | `polling` | `live`)
fn apply_env_overrides(config: &mut Config) {
    if let Some(ms) = read_env_u64("METRIC_STREAM_SETTLE_DELAY_MS") {
        config.coordinator.settle_delay_ms = ms;
    }
    if let Some(seconds) = read_env_u64("METRIC_STREAM_WINDOW_SECONDS") {
        config.coordinator.window_seconds = seconds;
    }
    if let Some(seconds) = read_env_u64("METRIC_STREAM_STEP_SECONDS") {
        match crate::types::StepSeconds::new(seconds) {
            Some(step) => config.coordinator.step_seconds = step,
            None => tracing::warn!("ignoring METRIC_STREAM_STEP_SECONDS=0"),
        }
    }
    if let Ok(mode) = std::env::var("METRIC_STREAM_FEED_MODE") {
        match mode.to_lowercase().as_str() {
            "auto" => config.coordinator.feed_mode = super::FeedMode::Auto,
            "polling" => config.coordinator.feed_mode = super::FeedMode::Polling,
            "live" => config.coordinator.feed_mode = super::FeedMode::Live,
            other => tracing::warn!("ignoring unknown METRIC_STREAM_FEED_MODE '{}'", other),
        }
    }
}

fn read_env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Load configuration from a TOML file, with environment variable overrides
pub fn load_config(config_path: &str) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let mut config: Config = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    apply_env_overrides(&mut config);

    // Validate the loaded configuration
    config.validate()?;

    Ok(config)
}

/// Load configuration from a file, falling back to built-in defaults when
/// the file does not exist
pub fn load_config_with_fallback(config_path: &str) -> Result<(Config, ConfigSource)> {
    if std::path::Path::new(config_path).exists() {
        let config = load_config(config_path)?;
        return Ok((config, ConfigSource::File(config_path.to_string())));
    }

    let mut config = create_default_config();
    apply_env_overrides(&mut config);
    config.validate()?;
    Ok((config, ConfigSource::Defaults))
}

/// Create a default configuration with a minimal overview catalogue,
/// for examples and testing
#[must_use]
pub fn create_default_config() -> Config {
    let channel = |id: &str, label: &str| ChannelSpec {
        id: ChannelId::new(id).expect("static channel id is non-empty"),
        label: label.to_string(),
    };

    Config {
        catalogue: vec![TabCatalogue {
            tab: TabId::new("overview").expect("static tab id is non-empty"),
            entity_kind: None,
            channels: vec![
                channel("cpu_load", "CPU load"),
                channel("mem_used", "Memory used"),
                channel("throughput_down", "Downlink throughput"),
                channel("throughput_up", "Uplink throughput"),
            ],
        }],
        ..Default::default()
    }
}
