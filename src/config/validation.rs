//! Configuration validation
//!
//! Identifier-level constraints (non-empty ids, non-zero step) are enforced
//! by the types at deserialization time; this checks the remaining semantic
//! constraints across the catalogue.

use anyhow::Result;
use std::collections::HashSet;

use super::types::{Config, TabCatalogue};

/// Settle delays beyond this are almost certainly a unit mistake
const MAX_RECOMMENDED_SETTLE_DELAY_MS: u64 = 10_000;

impl Config {
    /// Validate configuration for correctness
    ///
    /// - No duplicate (tab, entity kind) catalogue entries
    /// - No duplicate channel ids within a tab
    /// - Settle delay within a sane range (warning only)
    pub fn validate(&self) -> Result<()> {
        if self.coordinator.settle_delay_ms > MAX_RECOMMENDED_SETTLE_DELAY_MS {
            tracing::warn!(
                "settle_delay_ms is {} (> {} ms); selection changes will feel unresponsive",
                self.coordinator.settle_delay_ms,
                MAX_RECOMMENDED_SETTLE_DELAY_MS
            );
        }

        let mut seen = HashSet::new();
        for entry in &self.catalogue {
            let key = (entry.tab.clone(), entry.entity_kind);
            if !seen.insert(key) {
                return Err(anyhow::anyhow!(
                    "Duplicate catalogue entry for tab '{}' ({})",
                    entry.tab,
                    entry
                        .entity_kind
                        .map(|k| k.to_string())
                        .unwrap_or_else(|| "any kind".to_string())
                ));
            }
            validate_tab(entry)?;
        }

        Ok(())
    }
}

/// Validate a single tab catalogue
fn validate_tab(entry: &TabCatalogue) -> Result<()> {
    let mut seen = HashSet::new();
    for channel in &entry.channels {
        if !seen.insert(&channel.id) {
            return Err(anyhow::anyhow!(
                "Duplicate channel '{}' in tab '{}'",
                channel.id,
                entry.tab
            ));
        }
    }
    Ok(())
}
