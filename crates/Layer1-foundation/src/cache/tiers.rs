//! Multi-tier cache
//!
//! Three independently configured TTL stores behind one access point:
//! game context (short TTL), entity profiles (long TTL), hand analysis
//! (per-hand TTL). Constructed once at the composition root and shared by
//! `Arc`; all mutation is internally synchronized.

use super::profile::PlayerProfile;
use super::ttl::TtlCache;
use crate::config::CacheConfig;
use crate::game::{ActionKind, GameSnapshot, HandAnalysis, Phase};
use crate::Tendencies;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

// ============================================================================
// Key derivation
// ============================================================================
//
// Each tier has its own store, so keys can never collide across categories;
// derivation is a pure function of its inputs.

fn game_context_key(snapshot: &GameSnapshot, entity_id: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        snapshot.phase, snapshot.pot, snapshot.current_bet, entity_id
    )
}

fn profile_key(entity_id: &str) -> String {
    entity_id.to_string()
}

fn hand_key(hole_cards: &[String], community_cards: &[String]) -> String {
    let mut hole: Vec<&str> = hole_cards.iter().map(String::as_str).collect();
    let mut community: Vec<&str> = community_cards.iter().map(String::as_str).collect();
    hole.sort_unstable();
    community.sort_unstable();
    format!("{}/{}", hole.join("|"), community.join("|"))
}

// ============================================================================
// Stats & sweep reporting
// ============================================================================

/// Entry counts per tier.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheTierStats {
    pub game_context_entries: usize,
    pub profile_entries: usize,
    pub hand_analysis_entries: usize,
}

impl CacheTierStats {
    pub fn total(&self) -> usize {
        self.game_context_entries + self.profile_entries + self.hand_analysis_entries
    }
}

/// Per-tier eviction counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepReport {
    pub game_context: usize,
    pub profiles: usize,
    pub hand_analysis: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.game_context + self.profiles + self.hand_analysis
    }
}

// ============================================================================
// MultiTierCache
// ============================================================================

/// Shared cache for the three categories of derived game state.
#[derive(Debug)]
pub struct MultiTierCache {
    game_context: Mutex<TtlCache<String, String>>,
    profiles: Mutex<TtlCache<String, PlayerProfile>>,
    hand_analysis: Mutex<TtlCache<String, HandAnalysis>>,
}

impl MultiTierCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            game_context: Mutex::new(TtlCache::new(config.game_context_ttl())),
            profiles: Mutex::new(TtlCache::new(config.profile_ttl())),
            hand_analysis: Mutex::new(TtlCache::new(config.hand_analysis_ttl())),
        }
    }

    // ========================================================================
    // Game context
    // ========================================================================

    /// Cached context text for this table state, or a miss.
    pub fn get_game_context(&self, snapshot: &GameSnapshot, entity_id: &str) -> Option<String> {
        self.game_context
            .lock()
            .get(&game_context_key(snapshot, entity_id))
    }

    /// Store the context text built for this table state.
    pub fn put_game_context(&self, snapshot: &GameSnapshot, entity_id: &str, context: String) {
        self.game_context
            .lock()
            .put(game_context_key(snapshot, entity_id), context);
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Live profile for an entity, or a miss.
    pub fn get_profile(&self, entity_id: &str) -> Option<PlayerProfile> {
        self.profiles.lock().get(&profile_key(entity_id))
    }

    /// Record an observed action, creating a neutral profile when no live
    /// one exists. Write-through: the entry timestamp is refreshed, not
    /// merely touched.
    pub fn update_profile(
        &self,
        entity_id: &str,
        action: ActionKind,
        amount: u64,
        phase: Phase,
    ) -> Tendencies {
        let key = profile_key(entity_id);
        let mut tier = self.profiles.lock();

        let mut profile = tier
            .get(&key)
            .unwrap_or_else(|| PlayerProfile::new(entity_id));
        profile.record(action, amount, phase);
        let tendencies = profile.tendencies;
        tier.put(key, profile);

        tendencies
    }

    // ========================================================================
    // Hand analysis
    // ========================================================================

    /// Analysis cached for these card sets, or a miss. Card order within
    /// each set does not affect the lookup.
    pub fn get_hand_analysis(
        &self,
        hole_cards: &[String],
        community_cards: &[String],
    ) -> Option<HandAnalysis> {
        self.hand_analysis
            .lock()
            .get(&hand_key(hole_cards, community_cards))
    }

    pub fn cache_hand_analysis(
        &self,
        hole_cards: &[String],
        community_cards: &[String],
        analysis: HandAnalysis,
    ) {
        self.hand_analysis
            .lock()
            .put(hand_key(hole_cards, community_cards), analysis);
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Sweep every tier, returning per-tier eviction counts.
    pub fn sweep_all(&self) -> SweepReport {
        let report = SweepReport {
            game_context: self.game_context.lock().sweep(),
            profiles: self.profiles.lock().sweep(),
            hand_analysis: self.hand_analysis.lock().sweep(),
        };
        if report.total() > 0 {
            debug!(
                game_context = report.game_context,
                profiles = report.profiles,
                hand_analysis = report.hand_analysis,
                "cache sweep evicted entries"
            );
        }
        report
    }

    /// Entry counts per tier.
    pub fn stats(&self) -> CacheTierStats {
        CacheTierStats {
            game_context_entries: self.game_context.lock().len(),
            profile_entries: self.profiles.lock().len(),
            hand_analysis_entries: self.hand_analysis.lock().len(),
        }
    }
}
