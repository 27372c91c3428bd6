//! Engine and reclaimer configuration.

use crate::storage::DEFAULT_SHARDS;
use std::time::Duration;

/// Longest key accepted by default, in bytes.
pub const DEFAULT_MAX_KEY_LEN: usize = 250;

/// Largest value accepted by default, in bytes (1 MiB).
pub const DEFAULT_MAX_VALUE_LEN: usize = 1024 * 1024;

/// Configuration for an [`Engine`](crate::engine::Engine).
///
/// # Example
///
/// ```
/// use lapsekv::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_shards(8)
///     .with_max_value_len(4096);
/// assert_eq!(config.shards, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of storage shards (default: 64)
    pub shards: usize,

    /// Longest accepted key in bytes (default: 250)
    pub max_key_len: usize,

    /// Largest accepted value in bytes (default: 1 MiB)
    pub max_value_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    pub fn with_max_key_len(mut self, len: usize) -> Self {
        self.max_key_len = len;
        self
    }

    pub fn with_max_value_len(mut self, len: usize) -> Self {
        self.max_value_len = len;
        self
    }
}

/// Configuration for the background [`Reclaimer`](crate::engine::Reclaimer).
#[derive(Debug, Clone)]
pub struct ReclaimConfig {
    /// Base interval between passes (default: 100ms)
    pub base_interval: Duration,

    /// Minimum interval between passes (default: 10ms)
    pub min_interval: Duration,

    /// Maximum interval between passes (default: 1s)
    pub max_interval: Duration,

    /// If this fraction of entries were dead, speed up
    pub speedup_threshold: f64,

    /// If this fraction of entries were dead, slow down
    pub slowdown_threshold: f64,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_secs(1),
            speedup_threshold: 0.25,
            slowdown_threshold: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.shards, 64);
        assert_eq!(config.max_key_len, 250);
        assert_eq!(config.max_value_len, 1024 * 1024);
    }

    #[test]
    fn test_engine_config_builder() {
        let config = EngineConfig::new()
            .with_shards(4)
            .with_max_key_len(16)
            .with_max_value_len(32);
        assert_eq!(
            config,
            EngineConfig {
                shards: 4,
                max_key_len: 16,
                max_value_len: 32,
            }
        );
    }

    #[test]
    fn test_reclaim_config_bounds() {
        let config = ReclaimConfig::default();
        assert!(config.min_interval <= config.base_interval);
        assert!(config.base_interval <= config.max_interval);
        assert!(config.slowdown_threshold < config.speedup_threshold);
    }
}
