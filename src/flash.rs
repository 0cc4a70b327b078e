//! Flash messages: values set during one request and shown on the next.

use crate::session::Session;
use serde_json::{Map, Value};

/// Session key holding the messages for the next request.
pub const FLASH_KEY: &str = "_zest_flash_messages";

/// Flash messages of one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flash {
    now: Map<String, Value>,
    next: Map<String, Value>,
}

impl Flash {
    /// Messages stored by the previous request become the current ones.
    #[must_use]
    pub fn load(session: Option<&Session>) -> Self {
        let now = session
            .and_then(|s| s.get(FLASH_KEY))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { now, next: Map::new() }
    }

    /// Messages visible to this request.
    #[must_use]
    pub fn now(&self) -> &Map<String, Value> {
        &self.now
    }

    #[must_use]
    pub fn next(&self) -> &Map<String, Value> {
        &self.next
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.now.get(name)
    }

    /// Keep a message for the next request.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.next.insert(name.into(), value);
    }

    /// Make a message visible to this request only.
    pub fn set_now(&mut self, name: impl Into<String>, value: Value) {
        self.now.insert(name.into(), value);
    }

    /// Replace the stored messages with the ones set during this request.
    pub fn sweep(&mut self, session: &mut Session) {
        let next = std::mem::take(&mut self.next);
        if next.is_empty() {
            session.remove(FLASH_KEY);
        } else {
            session.set(FLASH_KEY, Value::Object(next));
        }
    }
}

/// Flash messages only survive responses that a browser renders as a page.
#[must_use]
pub fn sweeps_for(content_type: Option<&str>) -> bool {
    content_type.map_or(true, |ct| {
        ct.trim_start().to_ascii_lowercase().starts_with("text/html")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SessionStore};
    use serde_json::json;

    #[test]
    fn test_messages_move_to_next_request() {
        let store = MemorySessionStore::new();
        let mut session = Session::start(&store, None);

        let mut first = Flash::load(Some(&session));
        assert!(first.now().is_empty());
        first.set("notice", json!("saved"));
        assert!(first.get("notice").is_none());
        first.sweep(&mut session);
        session.save(&store);

        let cookie = session.id().to_string();
        let mut session = Session::start(&store, Some(&cookie));
        let mut second = Flash::load(Some(&session));
        assert_eq!(second.get("notice"), Some(&json!("saved")));

        second.sweep(&mut session);
        session.save(&store);
        let session = Session::start(&store, Some(&cookie));
        assert!(Flash::load(Some(&session)).now().is_empty());
        assert!(store.load(&session.id()).is_some());
    }

    #[test]
    fn test_set_now() {
        let mut flash = Flash::load(None);
        flash.set_now("a", json!(1));
        assert_eq!(flash.get("a"), Some(&json!(1)));
        assert!(flash.next().is_empty());
    }

    #[test]
    fn test_sweeps_for() {
        assert!(sweeps_for(None));
        assert!(sweeps_for(Some("text/html; charset=utf-8")));
        assert!(sweeps_for(Some("TEXT/HTML")));
        assert!(!sweeps_for(Some("application/json")));
        assert!(!sweeps_for(Some("text/plain")));
    }
}
