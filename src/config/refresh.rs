//! Background refresh configuration

use serde::{Deserialize, Serialize};

/// Configuration for the background refresh of the domain summary
/// and gateway list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Whether the background refresh runs while authenticated
    pub enabled: bool,
    /// Seconds between refresh cycles
    pub interval_seconds: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 30,
        }
    }
}
