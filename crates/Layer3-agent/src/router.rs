//! Decision routing
//!
//! Picks a context-assembly strategy from cache state, runs the exchange
//! through the session (so serialization and history bookkeeping hold),
//! tolerantly parses the reply, and writes derived state back into the
//! multi-tier cache.

use crate::parser;
use crate::prompt;
use crate::session::ConversationSession;
use railbird_foundation::game::{Decision, GameSnapshot, HandAnalysis};
use railbird_foundation::{MultiTierCache, Result};
use railbird_provider::Message;
use std::sync::Arc;
use tracing::{debug, warn};

/// Incremental sends only the delta since the last exchange; compressed
/// sends one self-contained state prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStrategy {
    Incremental,
    Compressed,
}

/// The router's result: the raw reply always, a decision only when the
/// reply parsed into an accepted action.
#[derive(Debug, Clone)]
pub struct RoutedDecision {
    pub decision: Option<Decision>,
    pub raw: String,
    pub strategy: ContextStrategy,
}

/// Routes decisions through the cheapest usable context.
pub struct DecisionRouter {
    cache: Arc<MultiTierCache>,
}

impl DecisionRouter {
    /// The cache is shared, injected state owned by the composition root.
    pub fn new(cache: Arc<MultiTierCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<MultiTierCache> {
        &self.cache
    }

    /// Ask the session for a decision on this snapshot.
    ///
    /// Transport and truncation failures propagate unmodified; a reply
    /// that fails to parse is returned with `decision: None` so the caller
    /// can apply its own fallback action.
    pub async fn decide(
        &self,
        session: &mut ConversationSession,
        snapshot: &GameSnapshot,
    ) -> Result<RoutedDecision> {
        let entity_id = session.entity_id().to_string();

        let cached_context = self.cache.get_game_context(snapshot, &entity_id);
        let strategy = if cached_context.is_some() && session.history().len() > 3 {
            ContextStrategy::Incremental
        } else {
            ContextStrategy::Compressed
        };
        debug!(entity = %entity_id, ?strategy, "selected context strategy");

        let system_messages: Vec<Message> = session
            .history()
            .iter()
            .filter(|m| m.is_system())
            .cloned()
            .collect();

        let (user_message, outbound) = match strategy {
            ContextStrategy::Incremental => {
                let user = Message::user(prompt::incremental_delta(snapshot));
                let mut outbound = system_messages;
                outbound.push(Message::assistant(prompt::acknowledgement()));
                outbound.push(user.clone());
                (user, outbound)
            }
            ContextStrategy::Compressed => {
                let user = Message::user(prompt::compressed_state(snapshot));
                let mut outbound = system_messages;
                outbound.push(user.clone());
                (user, outbound)
            }
        };

        let raw = session.decide_with_context(user_message, outbound).await?;

        let decision = parser::parse_decision(&raw);
        match decision {
            Some(ref decision) => self.write_back(&entity_id, snapshot, decision),
            None => {
                warn!(entity = %entity_id, "no decision extracted from reply");
            }
        }

        Ok(RoutedDecision {
            decision,
            raw,
            strategy,
        })
    }

    /// After an accepted decision: update the entity's profile, refresh
    /// the game-context entry, and cache the hand analysis when hole cards
    /// are known.
    fn write_back(&self, entity_id: &str, snapshot: &GameSnapshot, decision: &Decision) {
        self.cache
            .update_profile(entity_id, decision.action, decision.amount, snapshot.phase);

        self.cache
            .put_game_context(snapshot, entity_id, prompt::compressed_state(snapshot));

        if !snapshot.hole_cards.is_empty() {
            self.cache.cache_hand_analysis(
                &snapshot.hole_cards,
                &snapshot.community_cards,
                HandAnalysis::from_snapshot(snapshot),
            );
        }
    }
}
