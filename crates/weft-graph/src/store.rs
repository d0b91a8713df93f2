//! In-process relation store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use weft_core::{ExtractedGraph, GraphRelation, RelationStore, WeftError, WeftResult};

/// In-memory [`RelationStore`] implementation.
///
/// The default backend for tests and embedded use; durable stores plug in
/// through the same trait.
#[derive(Default)]
pub struct MemoryRelationStore {
    relations: RwLock<HashMap<String, GraphRelation>>,
}

impl MemoryRelationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelationStore for MemoryRelationStore {
    async fn list(&self, collection_id: &str) -> WeftResult<Vec<GraphRelation>> {
        let relations = self.relations.read().await;
        let mut matching: Vec<GraphRelation> = relations
            .values()
            .filter(|r| r.collection_id == collection_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn create(
        &self,
        collection_id: &str,
        graph: &ExtractedGraph,
    ) -> WeftResult<GraphRelation> {
        let relation = GraphRelation {
            id: Uuid::new_v4().to_string(),
            collection_id: collection_id.to_string(),
            graph: graph.clone(),
            created_at: Utc::now(),
        };
        self.relations
            .write()
            .await
            .insert(relation.id.clone(), relation.clone());
        Ok(relation)
    }

    async fn delete(&self, relation_id: &str) -> WeftResult<()> {
        match self.relations.write().await.remove(relation_id) {
            Some(_) => Ok(()),
            None => Err(WeftError::relation_store(format!(
                "relation '{}' not found",
                relation_id
            ))),
        }
    }
}
