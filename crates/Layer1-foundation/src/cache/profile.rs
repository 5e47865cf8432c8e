//! Per-entity behavioral profiles
//!
//! A profile keeps the full action history plus a bounded recent window;
//! tendency scores are derived from the tail of the recent window only.

use crate::game::{ActionKind, Phase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Cap on the recent-action window; the oldest entry is dropped first.
pub const RECENT_ACTIONS_CAP: usize = 20;

/// How many of the most recent actions feed tendency derivation.
pub const TENDENCY_WINDOW: usize = 10;

/// Deliberate ceiling on the bluff-frequency score.
pub const BLUFF_FREQUENCY_CEILING: f64 = 0.3;

// ============================================================================
// Tendencies
// ============================================================================

/// Behavioral scores in `[0, 1]`, derived from recent actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tendencies {
    pub aggression: f64,
    pub tightness: f64,
    pub bluff_frequency: f64,
}

impl Tendencies {
    /// Neutral starting point for an entity we know nothing about.
    pub fn neutral() -> Self {
        Self {
            aggression: 0.5,
            tightness: 0.5,
            bluff_frequency: 0.1,
        }
    }
}

impl Default for Tendencies {
    fn default() -> Self {
        Self::neutral()
    }
}

// ============================================================================
// Actions & Profile
// ============================================================================

/// One observed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAction {
    pub action: ActionKind,
    pub amount: u64,
    pub phase: Phase,
    pub at: DateTime<Utc>,
}

/// Rolling behavioral state for one entity.
#[derive(Debug, Clone)]
pub struct PlayerProfile {
    pub entity_id: String,

    /// Every action ever observed, unbounded.
    pub history: Vec<PlayerAction>,

    /// Bounded window of the most recent actions.
    pub recent_actions: VecDeque<PlayerAction>,

    pub tendencies: Tendencies,
}

impl PlayerProfile {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            history: Vec::new(),
            recent_actions: VecDeque::with_capacity(RECENT_ACTIONS_CAP),
            tendencies: Tendencies::neutral(),
        }
    }

    /// Record an action: appended to the unbounded history and the capped
    /// recent window, then tendencies are recomputed over the window tail.
    pub fn record(&mut self, action: ActionKind, amount: u64, phase: Phase) {
        let entry = PlayerAction {
            action,
            amount,
            phase,
            at: Utc::now(),
        };

        self.history.push(entry.clone());
        self.recent_actions.push_back(entry);
        while self.recent_actions.len() > RECENT_ACTIONS_CAP {
            self.recent_actions.pop_front();
        }

        self.tendencies = derive_tendencies(&self.recent_actions);
    }
}

/// Derive tendency scores from the most recent `min(TENDENCY_WINDOW, len)`
/// actions of the window.
///
/// Bluff frequency counts raises with a positive amount and is capped at
/// [`BLUFF_FREQUENCY_CEILING`].
pub fn derive_tendencies(recent: &VecDeque<PlayerAction>) -> Tendencies {
    let window_size = recent.len().min(TENDENCY_WINDOW);
    if window_size == 0 {
        return Tendencies::neutral();
    }

    let window = recent.iter().skip(recent.len() - window_size);

    let mut aggressive = 0usize;
    let mut folds = 0usize;
    let mut bluffs = 0usize;
    for entry in window {
        if entry.action.is_aggressive() {
            aggressive += 1;
        }
        if entry.action == ActionKind::Fold {
            folds += 1;
        }
        if entry.action == ActionKind::Raise && entry.amount > 0 {
            bluffs += 1;
        }
    }

    let size = window_size as f64;
    Tendencies {
        aggression: aggressive as f64 / size,
        tightness: folds as f64 / size,
        bluff_frequency: (bluffs as f64 / size).min(BLUFF_FREQUENCY_CEILING),
    }
}
