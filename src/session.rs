//! Per-client session state.
//!
//! A session is a JSON object keyed by a [`SessionId`] carried in the
//! configured cookie. Storage sits behind [`SessionStore`] so a dispatcher
//! can be given something other than the in-memory map.

use crate::ids::SessionId;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::debug;

pub type SessionData = Map<String, Value>;

/// Session persistence.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &SessionId) -> Option<SessionData>;
    fn save(&self, id: &SessionId, data: SessionData);
    fn remove(&self, id: &SessionId);
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, SessionData>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &SessionId) -> Option<SessionData> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    fn save(&self, id: &SessionId, data: SessionData) {
        self.sessions.insert(*id, data);
    }

    fn remove(&self, id: &SessionId) {
        self.sessions.remove(id);
    }
}

/// The session of one dispatch.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    data: SessionData,
    is_new: bool,
}

impl Session {
    /// Resume the session named by `cookie`, or open a fresh one when the
    /// cookie is absent, malformed or unknown to `store`.
    pub fn start(store: &dyn SessionStore, cookie: Option<&str>) -> Self {
        let existing = cookie
            .and_then(|c| c.parse::<SessionId>().ok())
            .and_then(|id| store.load(&id).map(|data| (id, data)));
        match existing {
            Some((id, data)) => {
                debug!(session_id = %id, "Session resumed");
                Self { id, data, is_new: false }
            }
            None => {
                let id = SessionId::new();
                debug!(session_id = %id, "Session opened");
                Self { id, data: SessionData::new(), is_new: true }
            }
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Whether the client has to be sent the session cookie.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Write the session back to `store`.
    pub fn save(&self, store: &dyn SessionStore) {
        store.save(&self.id, self.data.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_session_without_cookie() {
        let store = MemorySessionStore::new();
        let session = Session::start(&store, None);
        assert!(session.is_new());
        assert!(session.data().is_empty());
    }

    #[test]
    fn test_unknown_or_garbage_cookie_opens_new_session() {
        let store = MemorySessionStore::new();
        let unknown = SessionId::new().to_string();
        assert!(Session::start(&store, Some(&unknown)).is_new());
        assert!(Session::start(&store, Some("garbage")).is_new());
    }

    #[test]
    fn test_resume_after_save() {
        let store = MemorySessionStore::new();
        let mut session = Session::start(&store, None);
        session.set("user", json!("jane"));
        session.save(&store);

        let cookie = session.id().to_string();
        let resumed = Session::start(&store, Some(&cookie));
        assert!(!resumed.is_new());
        assert_eq!(resumed.id(), session.id());
        assert_eq!(resumed.get("user"), Some(&json!("jane")));

        store.remove(&session.id());
        assert!(store.is_empty());
    }
}
