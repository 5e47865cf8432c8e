//! Caching for derived game state
//!
//! Three layers, leaves first:
//! - `ttl`: the keyed TTL store primitive
//! - `profile`: rolling action windows and tendency derivation
//! - `tiers`: the multi-tier cache composing three TTL stores

pub mod profile;
pub mod tiers;
pub mod ttl;

pub use profile::{PlayerAction, PlayerProfile, Tendencies};
pub use tiers::{CacheTierStats, MultiTierCache, SweepReport};
pub use ttl::TtlCache;
