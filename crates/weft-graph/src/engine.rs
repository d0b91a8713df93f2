//! Ingestion orchestration: extract, consolidate, replace.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use weft_core::{
    Embedder, ExtractedGraph, GraphPrompts, Llm, MergeConfig, RelationStore, WeftResult,
};

use crate::extractor::GraphExtractor;
use crate::merger::GraphMerger;

/// Orchestrates per-document extraction and per-collection consolidation.
///
/// The read → merge → delete → create sequence against the relation store
/// is not atomic on its own, so the engine serializes it per collection
/// with an async mutex; ingestions into different collections proceed in
/// parallel.
pub struct GraphEngine {
    extractor: GraphExtractor,
    merger: GraphMerger,
    store: Arc<dyn RelationStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GraphEngine {
    /// Create a new graph engine over the given collaborators.
    pub fn new(
        llm: Arc<dyn Llm>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn RelationStore>,
        prompts: Arc<GraphPrompts>,
        config: MergeConfig,
    ) -> Self {
        Self {
            extractor: GraphExtractor::new(llm, prompts),
            merger: GraphMerger::new(embedder, config),
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Extract a graph from a document and fold it into the collection's
    /// canonical graph.
    ///
    /// An empty extraction is a valid outcome: the collection's existing
    /// graph is returned and the store is left untouched. Otherwise the
    /// existing relation (repaired to at most one) is merged with the new
    /// graph and replaced, delete-then-recreate.
    pub async fn extract_and_merge(
        &self,
        full_text: &str,
        collection_id: &str,
    ) -> WeftResult<ExtractedGraph> {
        let extracted = self.extractor.extract(full_text).await;

        let lock = self.collection_lock(collection_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_extraction(extracted, collection_id).await
        };
        self.evict_idle_lock(collection_id, &lock).await;
        result
    }

    /// The read → repair → merge → replace sequence. Runs with the
    /// collection's lock held.
    async fn apply_extraction(
        &self,
        extracted: ExtractedGraph,
        collection_id: &str,
    ) -> WeftResult<ExtractedGraph> {
        let mut relations = self.store.list(collection_id).await?;

        if extracted.is_empty() {
            debug!(collection_id, "extraction produced no graph, store untouched");
            return Ok(relations
                .first()
                .map(|r| r.graph.clone())
                .unwrap_or_default());
        }

        // Invariant repair: a collection holds at most one relation. Keep
        // the earliest-created survivor, delete the rest.
        if relations.len() > 1 {
            warn!(
                collection_id,
                count = relations.len(),
                "multiple relations found for collection, keeping earliest"
            );
            for extra in relations.drain(1..) {
                self.store.delete(&extra.id).await?;
            }
        }
        let existing = relations.pop();

        let merged = match &existing {
            Some(relation) => {
                self.merger
                    .merge(&[relation.graph.clone(), extracted])
                    .await?
            }
            None => self.merger.merge(&[extracted]).await?,
        };

        if let Some(relation) = existing {
            self.store.delete(&relation.id).await?;
        }
        self.store.create(collection_id, &merged).await?;

        Ok(merged)
    }

    /// Read the collection's canonical graph without modifying it.
    pub async fn canonical_graph(&self, collection_id: &str) -> WeftResult<ExtractedGraph> {
        let relations = self.store.list(collection_id).await?;
        Ok(relations
            .first()
            .map(|r| r.graph.clone())
            .unwrap_or_default())
    }

    /// Get (or create) the mutual-exclusion scope for a collection.
    async fn collection_lock(&self, collection_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(collection_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the collection's lock entry when no other ingest holds it,
    /// keeping the map bounded by the number of in-flight collections.
    async fn evict_idle_lock(&self, collection_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        if let Some(entry) = locks.get(collection_id) {
            // Two strong references mean the map's copy and ours; any
            // waiter would hold a third.
            if Arc::ptr_eq(entry, lock) && Arc::strong_count(entry) == 2 {
                locks.remove(collection_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRelationStore;
    use async_trait::async_trait;
    use weft_core::{GenerationOptions, LlmResponse, Message, WeftError};

    struct StaticLlm;

    #[async_trait]
    impl Llm for StaticLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> WeftResult<LlmResponse> {
            Ok(LlmResponse {
                content: Some(
                    r#"{"nodes": [{"id": "n1", "label": "Rust", "type": "concept"}], "edges": []}"#
                        .to_string(),
                ),
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "static"
        }
    }

    struct NoEmbedder;

    #[async_trait]
    impl Embedder for NoEmbedder {
        async fn embed(&self, _text: &str) -> WeftResult<Vec<f32>> {
            Err(WeftError::embedding("not used in this test"))
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "none"
        }
    }

    #[tokio::test]
    async fn test_collection_locks_evicted_when_idle() {
        let engine = GraphEngine::new(
            Arc::new(StaticLlm),
            Arc::new(NoEmbedder),
            Arc::new(MemoryRelationStore::new()),
            Arc::new(GraphPrompts::default()),
            MergeConfig::default(),
        );

        engine.extract_and_merge("some text", "c1").await.unwrap();
        engine.extract_and_merge("more text", "c2").await.unwrap();

        // Idle collections leave no lock entry behind.
        assert!(engine.locks.lock().await.is_empty());
    }
}
