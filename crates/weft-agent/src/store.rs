//! Retrieval and conversation-history collaborator boundaries.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use weft_core::{MessageRole, WeftResult};

/// A chunk of document text returned by retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The chunk text.
    pub text: String,
    /// Relevance score, higher is better.
    pub score: f32,
}

/// Vector retrieval boundary. The backing index (and how documents got
/// into it) belongs to a collaborator.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve the most relevant chunks for a query embedding.
    async fn retrieve(&self, embedding: &[f32], top_k: usize) -> WeftResult<Vec<RetrievedChunk>>;
}

/// One persisted conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker role.
    pub role: MessageRole,
    /// Turn content.
    pub content: String,
}

/// Conversation-history persistence boundary.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Append a turn to a session's history.
    async fn append(&self, session_id: &str, role: MessageRole, content: &str) -> WeftResult<()>;

    /// Read a session's history in order.
    async fn history(&self, session_id: &str) -> WeftResult<Vec<Turn>>;
}

/// In-memory [`TurnStore`] implementation.
#[derive(Default)]
pub struct MemoryTurnStore {
    sessions: RwLock<HashMap<String, Vec<Turn>>>,
}

impl MemoryTurnStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TurnStore for MemoryTurnStore {
    async fn append(&self, session_id: &str, role: MessageRole, content: &str) -> WeftResult<()> {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(Turn {
                role,
                content: content.to_string(),
            });
        Ok(())
    }

    async fn history(&self, session_id: &str) -> WeftResult<Vec<Turn>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_turn_store_round_trip() {
        let store = MemoryTurnStore::new();
        store.append("s1", MessageRole::User, "hi").await.unwrap();
        store
            .append("s1", MessageRole::Assistant, "hello")
            .await
            .unwrap();

        let history = store.history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].content, "hello");
        assert!(store.history("s2").await.unwrap().is_empty());
    }
}
