//! Session registry
//!
//! Owns the map of session id to session. Each session sits behind its own
//! mutex, which is what serializes same-session operations; operations on
//! different sessions run fully in parallel. The idle sweep is externally
//! ticked by the owning process.

use crate::session::{ConversationSession, Readiness};
use railbird_foundation::config::SessionConfig;
use railbird_foundation::{Error, Result};
use railbird_provider::CompletionClient;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<ConversationSession>>;

/// Aggregate counts over the registry.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub uninitialized: usize,
    pub warming: usize,
    pub ready: usize,
    pub expired: usize,
    pub active: usize,
    /// Sessions with an operation in flight at sampling time.
    pub busy: usize,
}

/// Owns every conversation session in the process.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    config: SessionConfig,
    client: Arc<dyn CompletionClient>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            client,
        }
    }

    /// Create a session for an entity and return its id and handle. The
    /// session starts uninitialized; callers run `initialize` through the
    /// handle.
    pub async fn create(
        &self,
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
    ) -> (Uuid, SessionHandle) {
        let session = ConversationSession::new(
            entity_id,
            entity_name,
            self.config.clone(),
            self.client.clone(),
        );
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));

        self.sessions.write().await.insert(id, handle.clone());
        info!(session = %id, "session created");
        (id, handle)
    }

    /// Look up a session by id.
    pub async fn get(&self, id: Uuid) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Find the session bound to an entity, if one exists.
    pub async fn find_by_entity(&self, entity_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        for handle in sessions.values() {
            // Identity fields are immutable, so a racing operation on the
            // session cannot change the answer; skip busy sessions rather
            // than waiting on their exchange.
            if let Ok(session) = handle.try_lock() {
                if session.entity_id() == entity_id {
                    return Some(handle.clone());
                }
            }
        }
        None
    }

    /// Get the entity's session or create a fresh uninitialized one.
    pub async fn get_or_create(
        &self,
        entity_id: &str,
        entity_name: &str,
    ) -> SessionHandle {
        if let Some(handle) = self.find_by_entity(entity_id).await {
            return handle;
        }
        self.create(entity_id, entity_name).await.1
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evict sessions inactive beyond the configured eviction age.
    ///
    /// Called periodically by the owning process. A session with an
    /// operation in flight is never touched: its lock is held, so its
    /// lease has not lapsed.
    pub async fn sweep_idle(&self) -> usize {
        let eviction_age = self.config.eviction_age();
        let mut evict = Vec::new();

        {
            let sessions = self.sessions.read().await;
            for (id, handle) in sessions.iter() {
                if let Ok(session) = handle.try_lock() {
                    if session.idle_duration() > eviction_age {
                        evict.push(*id);
                    }
                }
            }
        }

        if evict.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for id in evict {
            if sessions.remove(&id).is_some() {
                debug!(session = %id, "evicted idle session");
                removed += 1;
            }
        }
        info!(removed, "session sweep complete");
        removed
    }

    /// Aggregate statistics. Sessions with an operation in flight are
    /// counted as busy rather than awaited.
    pub async fn stats(&self) -> RegistryStats {
        let sessions = self.sessions.read().await;
        let mut stats = RegistryStats {
            total: sessions.len(),
            ..RegistryStats::default()
        };

        for handle in sessions.values() {
            match handle.try_lock() {
                Ok(session) => {
                    match session.readiness() {
                        Readiness::Uninitialized => stats.uninitialized += 1,
                        Readiness::Warming => stats.warming += 1,
                        Readiness::Ready => stats.ready += 1,
                        Readiness::Expired => stats.expired += 1,
                    }
                    if session.is_active() {
                        stats.active += 1;
                    }
                }
                Err(_) => stats.busy += 1,
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{ClientResult, MockClient};

    fn registry_with(config: SessionConfig, script: Vec<ClientResult>) -> SessionRegistry {
        SessionRegistry::new(config, MockClient::with_script(script))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = registry_with(SessionConfig::default(), vec![]);
        let (id, _) = registry.create("p1", "Alice").await;

        let handle = registry.get(id).await.unwrap();
        assert_eq!(handle.lock().await.entity_id(), "p1");
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_is_session_not_found() {
        let registry = registry_with(SessionConfig::default(), vec![]);
        let err = registry.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_entity_session() {
        let registry = registry_with(SessionConfig::default(), vec![]);
        let first = registry.get_or_create("p1", "Alice").await;
        let second = registry.get_or_create("p1", "Alice").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.count().await, 1);

        registry.get_or_create("p2", "Bob").await;
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_idle_sessions() {
        let config = SessionConfig {
            eviction_age_secs: 0,
            ..SessionConfig::default()
        };
        let registry = registry_with(config, vec![]);
        let (stale_id, _) = registry.create("p1", "Alice").await;
        let (_busy_id, busy) = registry.create("p2", "Bob").await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        // Hold the second session's lock, as an in-flight operation would
        let _guard = busy.lock().await;
        let removed = registry.sweep_idle().await;

        assert_eq!(removed, 1);
        assert!(registry.get(stale_id).await.is_err());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_sessions() {
        let registry = registry_with(SessionConfig::default(), vec![]);
        registry.create("p1", "Alice").await;

        assert_eq!(registry.sweep_idle().await, 0);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_stats_counts_states() {
        let registry = registry_with(
            SessionConfig::default(),
            vec![MockClient::reply("Ready.")],
        );
        let (_, handle) = registry.create("p1", "Alice").await;
        registry.create("p2", "Bob").await;

        handle.lock().await.initialize().await.unwrap();

        let stats = registry.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ready, 1);
        assert_eq!(stats.uninitialized, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.busy, 0);
    }

    #[tokio::test]
    async fn test_stats_counts_busy_sessions() {
        let registry = registry_with(SessionConfig::default(), vec![]);
        let (_, handle) = registry.create("p1", "Alice").await;

        let _guard = handle.lock().await;
        let stats = registry.stats().await;
        assert_eq!(stats.busy, 1);
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = registry_with(SessionConfig::default(), vec![]);
        let (id, _) = registry.create("p1", "Alice").await;

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert_eq!(registry.count().await, 0);
    }
}
