//! # railbird-foundation
//!
//! Foundation layer for Railbird:
//! - Error: central error type shared by every layer
//! - Config: cache and session tuning knobs (TOML + defaults)
//! - Tokenizer: character-based token estimation
//! - Game: boundary types for snapshots and decisions
//! - Cache: TTL primitive, multi-tier cache, profile accumulator

pub mod cache;
pub mod config;
pub mod error;
pub mod game;
pub mod tokenizer;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{CacheConfig, RailbirdConfig, SessionConfig, RAILBIRD_CONFIG_FILE};

// ============================================================================
// Game (boundary types)
// ============================================================================
pub use game::{
    ActionKind, Decision, GameSnapshot, HandAnalysis, MathAnalysis, OpponentRead, Phase,
};

// ============================================================================
// Cache
// ============================================================================
pub use cache::{
    // Profile accumulation
    PlayerAction,
    PlayerProfile,
    Tendencies,
    // Multi-tier cache
    CacheTierStats,
    MultiTierCache,
    SweepReport,
    // TTL primitive
    TtlCache,
};

// ============================================================================
// Tokenizer
// ============================================================================
pub use tokenizer::{estimate_tokens, TokenEstimator};
