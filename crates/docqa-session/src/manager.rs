//! Session registry keyed by session id.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use docqa_core::{Error, Result};
use docqa_ingest::Ingester;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use crate::session::Session;

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    created_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(rename = "sessionId")]
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

struct Registry {
    entries: HashMap<String, SessionEntry>,
    next_seq: u64,
}

/// Owns every live session. Each session sits behind its own async mutex so
/// that a streaming turn holds it exclusively.
pub struct SessionManager {
    registry: RwLock<Registry>,
    max_sessions: usize,
    ingester: Ingester,
}

impl SessionManager {
    pub fn new(max_sessions: usize, ingester: Ingester) -> Self {
        Self {
            registry: RwLock::new(Registry {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            max_sessions: max_sessions.max(1),
            ingester,
        }
    }

    /// Create a session, evicting the oldest one when at capacity.
    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), self.ingester.clone());

        let mut registry = self.registry.write();
        if registry.entries.len() >= self.max_sessions {
            if let Some(oldest_id) = registry
                .entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(id, _)| id.clone())
            {
                registry.entries.remove(&oldest_id);
                info!("Session evicted: {}", oldest_id);
            }
        }

        let seq = registry.next_seq;
        registry.next_seq += 1;
        registry.entries.insert(
            id.clone(),
            SessionEntry {
                session: Arc::new(Mutex::new(session)),
                created_at: Utc::now(),
                seq,
            },
        );
        info!("Session created: {}", id);
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.registry
            .read()
            .entries
            .get(id)
            .map(|e| Arc::clone(&e.session))
    }

    /// Take exclusive hold of a session without waiting.
    ///
    /// A session already held by an in-flight query is rejected rather than
    /// queued.
    pub fn try_acquire(&self, id: &str) -> Result<OwnedMutexGuard<Session>> {
        let session = self
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("session {}", id)))?;
        session
            .try_lock_owned()
            .map_err(|_| Error::Rejected("a query is already in progress".into()))
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.registry.write().entries.remove(id).is_some();
        if removed {
            info!("Session removed: {}", id);
        }
        removed
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<SessionSummary> {
        let registry = self.registry.read();
        let mut entries: Vec<(&String, &SessionEntry)> = registry.entries.iter().collect();
        entries.sort_by_key(|(_, e)| e.seq);
        entries
            .into_iter()
            .map(|(id, e)| SessionSummary {
                id: id.clone(),
                created_at: e.created_at.to_rfc3339(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registry.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(100, Ingester::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_remove() {
        let mgr = SessionManager::default();
        let id = mgr.create();
        assert!(mgr.get(&id).is_some());
        assert_eq!(mgr.len(), 1);
        assert!(mgr.remove(&id));
        assert!(!mgr.remove(&id));
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_oldest_session_evicted() {
        let mgr = SessionManager::new(2, Ingester::default());
        let first = mgr.create();
        let second = mgr.create();
        let third = mgr.create();

        assert!(mgr.get(&first).is_none());
        let ids: Vec<String> = mgr.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second, third]);
    }

    #[test]
    fn test_busy_session_rejected() {
        let mgr = SessionManager::default();
        let id = mgr.create();

        let _held = mgr.try_acquire(&id).unwrap();
        let err = mgr.try_acquire(&id).unwrap_err();
        assert_eq!(err.to_string(), "Rejected: a query is already in progress");
        assert_eq!(mgr.try_acquire("missing").unwrap_err().kind(), "not_found");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mgr = SessionManager::default();
        let a = mgr.create();
        let b = mgr.create();
        assert_ne!(a, b);

        let session_a = mgr.try_acquire(&a).unwrap();
        assert_eq!(session_a.id(), a);
        assert!(mgr.try_acquire(&b).is_ok());
    }
}
