//! Session store keyed by caller-supplied session id
//!
//! Each session owns its own conversation log behind an async mutex, so
//! requests on one session are serialized while distinct sessions never
//! contend with each other.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::types::{ConversationLog, Turn};

/// One conversation
pub struct Session {
    log: Mutex<ConversationLog>,
    last_active: parking_lot::Mutex<DateTime<Utc>>,
}

impl Session {
    fn new(max_turns: usize) -> Self {
        Self {
            log: Mutex::new(ConversationLog::with_max_turns(max_turns)),
            last_active: parking_lot::Mutex::new(Utc::now()),
        }
    }

    /// The conversation log; hold the guard for the whole exchange
    pub fn log(&self) -> &Mutex<ConversationLog> {
        &self.log
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        *self.last_active.lock()
    }

    /// Mark the session as used now
    pub fn touch(&self) {
        *self.last_active.lock() = Utc::now();
    }
}

/// Idle timeout as a signed duration, saturating for out-of-range values
fn idle_timeout(secs: u64) -> ChronoDuration {
    i64::try_from(secs)
        .ok()
        .and_then(ChronoDuration::try_seconds)
        .unwrap_or(ChronoDuration::MAX)
}

/// Concurrent map from session id to session
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    max_turns: usize,
    idle_timeout: ChronoDuration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns: config.max_turns,
            idle_timeout: idle_timeout(config.idle_timeout_secs),
        }
    }

    /// Generate a fresh session id
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Fetch a session, creating it when unknown
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        let entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!("Created session {}", id);
            Arc::new(Session::new(self.max_turns))
        });
        // Touch while the shard is locked so a concurrent purge cannot see it idle
        entry.touch();
        Arc::clone(entry.value())
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Copy of a session's turns
    pub async fn history(&self, id: &str) -> Option<Vec<Turn>> {
        let session = self.get(id)?;
        let log = session.log().lock().await;
        Some(log.turns().to_vec())
    }

    /// Drop a session; returns whether it existed
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for longer than the timeout
    ///
    /// Sessions with an exchange in flight (log locked) are kept.
    pub fn purge_expired(&self) -> usize {
        match Utc::now().checked_sub_signed(self.idle_timeout) {
            Some(cutoff) => self.purge_idle_since(cutoff),
            None => 0,
        }
    }

    fn purge_idle_since(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            session.last_active() >= cutoff || session.log().try_lock().is_err()
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Periodically purge idle sessions
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = self.purge_expired();
                if purged > 0 {
                    tracing::info!(
                        "Purged {} idle sessions ({} active)",
                        purged,
                        self.sessions.len()
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig::default())
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = store();
        {
            let alice = store.get_or_create("alice");
            alice.log().lock().await.commit_exchange("What is a stack?", "LIFO.");
        }
        store.get_or_create("bob");

        assert_eq!(store.history("alice").await.unwrap().len(), 2);
        assert!(store.history("bob").await.unwrap().is_empty());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let store = store();
        let first = store.get_or_create("s1");
        let second = store.get_or_create("s1");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_unknown_session_has_no_history() {
        assert!(store().history("missing").await.is_none());
    }

    #[test]
    fn test_remove() {
        let store = store();
        store.get_or_create("s1");
        assert!(store.remove("s1"));
        assert!(!store.remove("s1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_idle_sessions() {
        let store = store();
        store.get_or_create("old");

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.purge_idle_since(Utc::now() + ChronoDuration::seconds(1)), 1);
        assert!(store.get("old").is_none());
    }

    #[tokio::test]
    async fn test_purge_keeps_busy_sessions() {
        let store = store();
        let session = store.get_or_create("busy");
        let _guard = session.log().lock().await;

        assert_eq!(store.purge_idle_since(Utc::now() + ChronoDuration::seconds(1)), 0);
        assert!(store.get("busy").is_some());
    }

    #[test]
    fn test_huge_idle_timeout_never_expires() {
        let store = SessionStore::new(&SessionConfig {
            idle_timeout_secs: u64::MAX,
            ..SessionConfig::default()
        });
        store.get_or_create("s1");

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(idle_timeout(u64::MAX), ChronoDuration::MAX);
        assert_eq!(idle_timeout(60), ChronoDuration::seconds(60));
    }

    #[test]
    fn test_get_or_create_refreshes_activity() {
        let store = store();
        let two_hours_ago = Utc::now() - ChronoDuration::hours(2);
        let cutoff = Utc::now() - ChronoDuration::hours(1);

        *store.get_or_create("revisited").last_active.lock() = two_hours_ago;
        *store.get_or_create("abandoned").last_active.lock() = two_hours_ago;
        store.get_or_create("revisited");

        assert_eq!(store.purge_idle_since(cutoff), 1);
        assert!(store.get("revisited").is_some());
        assert!(store.get("abandoned").is_none());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionStore::new_session_id(), SessionStore::new_session_id());
    }
}
