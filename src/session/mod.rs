//! Per-session conversation storage.

mod memory;

pub use memory::InMemorySessionStore;

use async_trait::async_trait;

use crate::llm::ChatMessage;

/// Storage abstraction for per-session conversation history.
///
/// Call sites only see this trait, so the in-process default can be swapped
/// for a durable or expiring backend without touching them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Conversation recorded so far for a session; empty for unknown ids.
    async fn history(&self, session_id: &str) -> Vec<ChatMessage>;

    /// Append messages to a session, creating it on first use.
    async fn append(&self, session_id: &str, messages: Vec<ChatMessage>);
}
