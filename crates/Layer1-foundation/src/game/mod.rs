//! Boundary types for the game engine interface
//!
//! Snapshots come in from the engine read-only; decisions go back out.
//! Everything external crosses this boundary as a concrete typed record.

use crate::cache::Tendencies;
use serde::{Deserialize, Serialize};

// ============================================================================
// Phase & Action
// ============================================================================

/// Betting street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preflop => "preflop",
            Phase::Flop => "flop",
            Phase::Turn => "turn",
            Phase::River => "river",
            Phase::Showdown => "showdown",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player action the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    #[serde(rename = "all-in")]
    AllIn,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::Raise => "raise",
            ActionKind::AllIn => "all-in",
        }
    }

    /// Parse the engine's action vocabulary. Anything outside the five
    /// accepted names is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fold" => Some(ActionKind::Fold),
            "check" => Some(ActionKind::Check),
            "call" => Some(ActionKind::Call),
            "raise" => Some(ActionKind::Raise),
            "all-in" => Some(ActionKind::AllIn),
            _ => None,
        }
    }

    /// Raises and shoves count as aggressive.
    pub fn is_aggressive(&self) -> bool {
        matches!(self, ActionKind::Raise | ActionKind::AllIn)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Inbound snapshot
// ============================================================================

/// Mathematical read on the current hand, when the engine provides one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MathAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pot_odds: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outs: Option<u32>,
}

/// What we know about one opponent, as tendencies derived elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentRead {
    pub entity_id: String,
    pub tendencies: Tendencies,
}

/// Read-only view of the table at decision time.
///
/// Consumed by prompt construction and cache key derivation; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub phase: Phase,
    pub pot: u64,
    pub current_bet: u64,
    pub hole_cards: Vec<String>,
    pub community_cards: Vec<String>,
    pub chips: u64,
    pub position: String,
    pub position_index: u32,
    pub to_call: u64,
    pub action_sequence: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_reads: Option<Vec<OpponentRead>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub math: Option<MathAnalysis>,
}

// ============================================================================
// Derived hand analysis
// ============================================================================

/// Per-hand analysis cached between decisions of the same hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HandAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pot_odds: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<f64>,
}

impl HandAnalysis {
    /// Derive from a snapshot, preferring the engine's math when present and
    /// falling back to pot odds computed from the table state.
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        let pot_odds = snapshot
            .math
            .as_ref()
            .and_then(|m| m.pot_odds)
            .or_else(|| {
                if snapshot.to_call == 0 {
                    None
                } else {
                    Some(snapshot.to_call as f64 / (snapshot.pot + snapshot.to_call) as f64)
                }
            });

        Self {
            win_probability: snapshot.math.as_ref().and_then(|m| m.win_probability),
            pot_odds,
            expected_value: snapshot.math.as_ref().and_then(|m| m.expected_value),
        }
    }
}

// ============================================================================
// Outbound decision
// ============================================================================

/// The structured decision handed back to the game engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: ActionKind,

    /// Chips committed by the action; zero for fold/check.
    pub amount: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Decision {
    pub fn new(action: ActionKind, amount: u64) -> Self {
        Self {
            action,
            amount,
            confidence: None,
            reasoning: None,
        }
    }
}
