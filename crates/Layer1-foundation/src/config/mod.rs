//! Railbird configuration
//!
//! Tuning knobs for the cache tiers and the session layer. Everything has a
//! sensible default; a TOML file can override any subset of fields.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name searched for by [`RailbirdConfig::load_from`] callers.
pub const RAILBIRD_CONFIG_FILE: &str = "railbird.toml";

// ============================================================================
// Cache Config
// ============================================================================

/// Time-to-live settings for the three cache tiers.
///
/// Each tier expires independently; a sweep is caller-triggered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Game-context entries: short-lived, keyed by the table state.
    pub game_context_ttl_secs: u64,

    /// Entity-profile entries: long-lived behavioral state.
    pub profile_ttl_secs: u64,

    /// Hand-analysis entries: valid for roughly one hand.
    pub hand_analysis_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            game_context_ttl_secs: 30,
            profile_ttl_secs: 300,
            hand_analysis_ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn game_context_ttl(&self) -> Duration {
        Duration::from_secs(self.game_context_ttl_secs)
    }

    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    pub fn hand_analysis_ttl(&self) -> Duration {
        Duration::from_secs(self.hand_analysis_ttl_secs)
    }
}

// ============================================================================
// Session Config
// ============================================================================

/// Session-layer tuning: history window, idle thresholds, sweep cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// History length beyond which window maintenance trims non-system
    /// messages down to the most recent ones.
    pub history_window: usize,

    /// Cap on the per-entity recent-action window.
    pub recent_actions_cap: usize,

    /// How many of the most recent actions feed tendency derivation.
    pub tendency_window: usize,

    /// A ready session idle longer than this is flipped to expired by a
    /// health check (recovery stays caller-initiated).
    pub idle_expiry_secs: u64,

    /// A session inactive longer than this is evicted by the registry sweep.
    pub eviction_age_secs: u64,

    /// Suggested cadence for the owning process to call the registry sweep.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            recent_actions_cap: 20,
            tendency_window: 10,
            idle_expiry_secs: 30 * 60,
            eviction_age_secs: 60 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

impl SessionConfig {
    pub fn idle_expiry(&self) -> Duration {
        Duration::from_secs(self.idle_expiry_secs)
    }

    pub fn eviction_age(&self) -> Duration {
        Duration::from_secs(self.eviction_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

// ============================================================================
// Railbird Config (unified)
// ============================================================================

/// Unified configuration, loadable from a single TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RailbirdConfig {
    pub cache: CacheConfig,
    pub session: SessionConfig,
}

impl RailbirdConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file, falling back to defaults for absent fields.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Parse from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RailbirdConfig::default();
        assert_eq!(config.cache.game_context_ttl(), Duration::from_secs(30));
        assert_eq!(config.cache.profile_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.hand_analysis_ttl(), Duration::from_secs(60));
        assert_eq!(config.session.history_window, 10);
        assert_eq!(config.session.recent_actions_cap, 20);
        assert_eq!(config.session.idle_expiry(), Duration::from_secs(1800));
        assert_eq!(config.session.eviction_age(), Duration::from_secs(3600));
    }

    #[test]
    fn test_partial_toml_override() {
        let config = RailbirdConfig::from_toml(
            r#"
            [cache]
            game_context_ttl_secs = 10

            [session]
            history_window = 6
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.game_context_ttl_secs, 10);
        // Untouched fields keep their defaults
        assert_eq!(config.cache.profile_ttl_secs, 300);
        assert_eq!(config.session.history_window, 6);
        assert_eq!(config.session.eviction_age_secs, 3600);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = RailbirdConfig::from_toml("cache = 5").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
