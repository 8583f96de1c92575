//! In-memory session store (non-persistent).
//!
//! History lives for the process lifetime only and grows without bound;
//! there is no eviction. Restarts start every session from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::SessionStore;
use crate::llm::ChatMessage;

#[derive(Debug, Clone)]
struct SessionEntry {
    messages: Vec<ChatMessage>,
    last_activity: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions seen so far.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// When a session last recorded a message.
    pub async fn last_activity(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.last_activity)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.messages.clone())
            .unwrap_or_default()
    }

    async fn append(&self, session_id: &str, messages: Vec<ChatMessage>) {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                messages: Vec::new(),
                last_activity: Utc::now(),
            });
        entry.messages.extend(messages);
        entry.last_activity = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_accumulates_per_session() {
        let store = InMemorySessionStore::new();

        store
            .append("abc", vec![ChatMessage::user("hi")])
            .await;
        store
            .append(
                "abc",
                vec![ChatMessage::assistant("hello"), ChatMessage::user("again")],
            )
            .await;

        let history = store.history("abc").await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], ChatMessage::user("hi"));
        assert_eq!(history[2], ChatMessage::user("again"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::new();

        store.append("abc", vec![ChatMessage::user("hi")]).await;

        assert!(store.history("xyz").await.is_empty());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn append_records_activity() {
        let store = InMemorySessionStore::new();
        assert!(store.last_activity("abc").await.is_none());

        store.append("abc", vec![ChatMessage::user("hi")]).await;
        assert!(store.last_activity("abc").await.is_some());
    }
}
