//! # railbird-agent
//!
//! The session layer: one long-lived dialogue per AI entity, a registry
//! that owns them, and a router that picks context strategies and parses
//! decisions out of near-JSON replies.

pub mod parser;
pub mod prompt;
pub mod registry;
pub mod router;
pub mod session;

pub use parser::parse_decision;
pub use registry::{RegistryStats, SessionHandle, SessionRegistry};
pub use router::{ContextStrategy, DecisionRouter, RoutedDecision};
pub use session::{ConversationSession, Readiness, StatusUpdate, TokenAccounting};
