//! Conversation sessions
//!
//! One long-lived dialogue per AI entity. The session owns its message
//! history, the cache-readiness state machine, and token accounting. The
//! remote exchange is the only suspension point; everything else mutates
//! synchronously, and the registry wraps each session in its own mutex so
//! same-session operations are strictly serialized.

use crate::prompt;
use chrono::{DateTime, Utc};
use railbird_foundation::config::SessionConfig;
use railbird_foundation::game::GameSnapshot;
use railbird_foundation::tokenizer::estimate_tokens;
use railbird_foundation::{Error, Result};
use railbird_provider::{ClientError, Completion, CompletionClient, Message};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// State machine
// ============================================================================

/// Cache readiness of a session's remote context.
///
/// `Uninitialized → Warming → Ready`; `Ready → Expired` on health-check
/// failure or inactivity; `Expired → Warming → Ready` on recovery;
/// `Warming → Uninitialized` on warm-up failure (a failed warm-up never
/// happened).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Uninitialized,
    Warming,
    Ready,
    Expired,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Uninitialized => "uninitialized",
            Readiness::Warming => "warming",
            Readiness::Ready => "ready",
            Readiness::Expired => "expired",
        }
    }
}

/// Token accounting over the retained history.
///
/// Both fields are recomputed from retained messages, never drifted
/// incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenAccounting {
    pub system_tokens: u32,
    pub total_tokens: u32,
}

/// Seating/stack update sent between hands, out of band of decisions.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub position: String,
    pub seat_index: u32,
    pub total_seats: u32,
    pub chips: u64,
    pub dealer_position: Option<u32>,
}

// ============================================================================
// ConversationSession
// ============================================================================

/// One persistent dialogue context for a single AI-controlled entity.
pub struct ConversationSession {
    id: Uuid,
    entity_id: String,
    entity_name: String,

    readiness: Readiness,
    active: bool,
    initialized: bool,

    history: Vec<Message>,
    last_activity: DateTime<Utc>,
    tokens: TokenAccounting,

    config: SessionConfig,
    client: Arc<dyn CompletionClient>,
}

impl ConversationSession {
    pub fn new(
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
        config: SessionConfig,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            readiness: Readiness::Uninitialized,
            active: false,
            initialized: false,
            history: Vec::new(),
            last_activity: Utc::now(),
            tokens: TokenAccounting::default(),
            config,
            client,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn tokens(&self) -> TokenAccounting {
        self.tokens
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Time since the last successful exchange.
    pub fn idle_duration(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.last_activity)
            .to_std()
            .unwrap_or_default()
    }

    // ========================================================================
    // Lifecycle operations
    // ========================================================================

    /// Warm up the session: primer + identity confirmation + one
    /// confirmation exchange. The primer's tokens are paid here, once.
    ///
    /// On failure the session stays discoverable in `Uninitialized` so the
    /// caller can retry.
    pub async fn initialize(&mut self) -> Result<()> {
        info!(session = %self.id, entity = %self.entity_id, "warming up session");
        self.readiness = Readiness::Warming;

        match self.run_warmup().await {
            Ok(()) => {
                self.readiness = Readiness::Ready;
                self.active = true;
                self.initialized = true;
                self.last_activity = Utc::now();
                debug!(
                    session = %self.id,
                    system_tokens = self.tokens.system_tokens,
                    "session ready"
                );
                Ok(())
            }
            Err(e) => {
                // A failed warm-up is treated as never started
                self.readiness = Readiness::Uninitialized;
                self.active = false;
                Err(Error::warmup(self.id.to_string(), e.to_string()))
            }
        }
    }

    /// Ask for a decision on the current snapshot. Requires `Ready`.
    ///
    /// Returns the raw reply text; structured parsing is the router's job.
    /// A failed exchange leaves the session `Ready` and the appended user
    /// message in place — no rollback.
    pub async fn decide(&mut self, snapshot: &GameSnapshot) -> Result<String> {
        self.require_ready()?;
        self.push_message(Message::user(prompt::compressed_state(snapshot)));
        let outbound = self.history.clone();
        self.exchange_and_record(&outbound).await
    }

    /// Decision exchange with a caller-built outbound message list. The
    /// router uses this to send a reduced context while the session still
    /// records the user message and the reply in its history.
    pub async fn decide_with_context(
        &mut self,
        user_message: Message,
        outbound: Vec<Message>,
    ) -> Result<String> {
        self.require_ready()?;
        self.push_message(user_message);
        self.exchange_and_record(&outbound).await
    }

    /// Out-of-band seating/stack update so the remote side's latent context
    /// reflects the table between hands. Readiness is not touched.
    pub async fn update_status(&mut self, update: &StatusUpdate) -> Result<()> {
        self.require_ready()?;
        self.push_message(Message::user(prompt::status_update(update)));
        let outbound = self.history.clone();
        self.exchange_and_record(&outbound).await.map(|_| ())
    }

    /// Re-run the warm-up against this same session object.
    ///
    /// Returns whether recovery succeeded; an expected failure flips the
    /// session to `Expired` instead of erroring.
    pub async fn recover(&mut self) -> bool {
        info!(session = %self.id, entity = %self.entity_id, "recovering session");
        self.readiness = Readiness::Warming;

        match self.run_warmup().await {
            Ok(()) => {
                self.readiness = Readiness::Ready;
                self.active = true;
                self.initialized = true;
                self.last_activity = Utc::now();
                true
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "recovery failed");
                self.readiness = Readiness::Expired;
                self.active = false;
                false
            }
        }
    }

    /// Report whether the session is usable, attempting one recovery when
    /// it is not.
    ///
    /// A ready session idle past the expiry threshold flips to `Expired`
    /// and reports unhealthy without recovering; recovery for idle sessions
    /// is caller-initiated so an idle seat never burns requests silently.
    pub async fn health_check(&mut self) -> bool {
        if self.readiness == Readiness::Ready && self.initialized {
            if self.idle_duration() > self.config.idle_expiry() {
                warn!(
                    session = %self.id,
                    idle_secs = self.idle_duration().as_secs(),
                    "session expired from inactivity"
                );
                self.readiness = Readiness::Expired;
                self.active = false;
                return false;
            }
            return true;
        }

        self.recover().await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn require_ready(&self) -> Result<()> {
        if self.readiness != Readiness::Ready || !self.initialized {
            return Err(Error::SessionNotReady(format!(
                "session {} is {}",
                self.id,
                self.readiness.as_str()
            )));
        }
        Ok(())
    }

    /// Append the primer and confirmation, run the exchange, append the
    /// reply. On failure the appended pair is rolled back so a retry starts
    /// from a clean sequence.
    async fn run_warmup(&mut self) -> std::result::Result<(), ClientError> {
        let before = self.history.len();
        self.push_message(Message::system(prompt::primer(&self.entity_name)));
        self.push_message(Message::user(prompt::identity_confirmation(
            &self.entity_name,
        )));

        let outbound = self.history.clone();
        match self
            .client
            .complete(&outbound)
            .await
            .and_then(Completion::into_text)
        {
            Ok(reply) => {
                self.push_message(Message::assistant(reply));
                self.recompute_tokens();
                Ok(())
            }
            Err(e) => {
                self.history.truncate(before);
                self.recompute_tokens();
                Err(e)
            }
        }
    }

    /// Run one exchange and record the accepted reply. The user message is
    /// already in history; on failure it stays there and the state is
    /// otherwise unchanged.
    async fn exchange_and_record(&mut self, outbound: &[Message]) -> Result<String> {
        let text = self
            .client
            .complete(outbound)
            .await
            .and_then(Completion::into_text)
            .map_err(Error::from)?;

        self.push_message(Message::assistant(text.clone()));
        self.last_activity = Utc::now();
        self.maintain_window();
        Ok(text)
    }

    fn push_message(&mut self, mut message: Message) {
        message.token_count = Some(estimate_tokens(&message.content));
        self.history.push(message);
        self.recompute_tokens();
    }

    /// Trim history beyond the window limit: every system message is
    /// retained, then the most recent non-system messages fill the rest.
    fn maintain_window(&mut self) {
        let limit = self.config.history_window;
        if self.history.len() > limit {
            let system_count = self.history.iter().filter(|m| m.is_system()).count();
            let keep_tail = limit.saturating_sub(system_count);
            let non_system_total = self.history.len() - system_count;
            let drop_first = non_system_total.saturating_sub(keep_tail);

            let mut dropped = 0usize;
            self.history.retain(|m| {
                if m.is_system() {
                    true
                } else if dropped < drop_first {
                    dropped += 1;
                    false
                } else {
                    true
                }
            });
            debug!(session = %self.id, dropped, "trimmed session history");
        }
        self.recompute_tokens();
    }

    /// Token totals are a pure function of the retained history.
    fn recompute_tokens(&mut self) {
        let mut system = 0u32;
        let mut total = 0u32;
        for message in &self.history {
            let count = message
                .token_count
                .unwrap_or_else(|| estimate_tokens(&message.content));
            total += count;
            if message.is_system() {
                system += count;
            }
        }
        self.tokens = TokenAccounting {
            system_tokens: system,
            total_tokens: total,
        };
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("entity_id", &self.entity_id)
            .field("readiness", &self.readiness)
            .field("active", &self.active)
            .field("history_len", &self.history.len())
            .field("tokens", &self.tokens)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
