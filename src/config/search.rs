//! Search engine configuration

use serde::{Deserialize, Serialize};

/// Configuration for the debounced remote search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Keystroke settle window in milliseconds before a remote
    /// search call is issued
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.debounce_ms, 300);
    }
}
