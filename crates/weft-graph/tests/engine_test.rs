//! End-to-end ingestion scenarios against the in-memory relation store.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use weft_core::{
    Embedder, ExtractedGraph, GenerationOptions, GraphPrompts, Llm, LlmResponse, MergeConfig,
    Message, RelationStore, WeftError, WeftResult,
};
use weft_graph::{GraphEngine, MemoryRelationStore};

/// LLM that pops one scripted response per call.
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedLlm {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> WeftResult<LlmResponse> {
        let next = self.responses.lock().await.pop_front();
        match next {
            Some(content) => Ok(LlmResponse {
                content: Some(content),
                usage: None,
            }),
            None => Err(WeftError::llm("no scripted response left")),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Embedder with a fixed normalized-label -> vector table.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new() -> Arc<Self> {
        let entries: &[(&str, Vec<f32>)] = &[
            ("ai", vec![1.0, 0.0, 0.0]),
            ("artificial intelligence", vec![0.99, 0.14, 0.0]),
            ("rust", vec![0.0, 1.0, 0.0]),
            ("tokio", vec![0.0, 0.5, 0.87]),
        ];
        Arc::new(Self {
            table: entries
                .iter()
                .map(|(label, vector)| (label.to_string(), vector.clone()))
                .collect(),
        })
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> WeftResult<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| WeftError::embedding(format!("no vector for '{}'", text)))
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

fn engine(llm: Arc<ScriptedLlm>, store: Arc<dyn RelationStore>) -> GraphEngine {
    GraphEngine::new(
        llm,
        TableEmbedder::new(),
        store,
        Arc::new(GraphPrompts::default()),
        MergeConfig::with_threshold(0.85),
    )
}

const DOC1_GRAPH: &str = r#"{
    "nodes": [
        {"id": "n1", "label": "AI", "type": "concept"},
        {"id": "n2", "label": "Rust", "type": "concept"}
    ],
    "edges": [{"label": "related_to", "source": "n1", "target": "n2"}]
}"#;

const DOC2_GRAPH: &str = r#"{
    "nodes": [
        {"id": "n1", "label": "Artificial Intelligence", "type": "concept"},
        {"id": "n2", "label": "Tokio", "type": "library"}
    ],
    "edges": []
}"#;

#[tokio::test]
async fn test_single_relation_invariant_across_ingests() {
    let store = Arc::new(MemoryRelationStore::new());
    let engine = engine(ScriptedLlm::new(&[DOC1_GRAPH, DOC2_GRAPH]), store.clone());

    // Ingest document 1: creates the collection's relation.
    engine.extract_and_merge("doc one text", "c1").await.unwrap();
    assert_eq!(store.list("c1").await.unwrap().len(), 1);

    // Ingest document 2: merges into the existing relation, still one row.
    let merged = engine.extract_and_merge("doc two text", "c1").await.unwrap();
    let relations = store.list("c1").await.unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].graph, merged);

    // "AI" and "Artificial Intelligence" collapsed into one canonical node.
    let labels: Vec<&str> = merged.nodes.iter().map(|n| n.label.as_str()).collect();
    assert!(labels.contains(&"Artificial Intelligence"));
    assert!(!labels.contains(&"AI"));
    assert_eq!(merged.node_count(), 3);
    // The doc-1 edge survived remapping onto the merged node set.
    assert_eq!(merged.edge_count(), 1);
    assert_eq!(merged.edges[0].source, "merged_artificial_intelligence");
}

#[tokio::test]
async fn test_duplicate_relation_repair() {
    let store = Arc::new(MemoryRelationStore::new());
    // Simulate a race that left two relations for one collection.
    let seeded = ExtractedGraph::new(
        vec![weft_core::GraphNode::new("n1", "Rust", "concept")],
        vec![],
    );
    store.create("c1", &seeded).await.unwrap();
    store.create("c1", &ExtractedGraph::default()).await.unwrap();
    assert_eq!(store.list("c1").await.unwrap().len(), 2);

    let engine = engine(ScriptedLlm::new(&[DOC1_GRAPH]), store.clone());
    engine.extract_and_merge("doc text", "c1").await.unwrap();

    // The engine kept the earliest, deleted the extra, and replaced it with
    // exactly one merged relation.
    assert_eq!(store.list("c1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_extraction_leaves_store_untouched() {
    let store = Arc::new(MemoryRelationStore::new());
    let engine = engine(ScriptedLlm::new(&[DOC1_GRAPH, "no graph here"]), store.clone());

    let first = engine.extract_and_merge("doc one", "c1").await.unwrap();
    let before = store.list("c1").await.unwrap();

    // The second response is unparseable, so extraction yields an empty
    // graph and the existing canonical graph is returned unchanged.
    let second = engine.extract_and_merge("doc two", "c1").await.unwrap();
    assert_eq!(second, first);

    let after = store.list("c1").await.unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 1);
    assert_eq!(before[0].id, after[0].id);
}

#[tokio::test]
async fn test_concurrent_ingests_serialize_per_collection() {
    let store = Arc::new(MemoryRelationStore::new());
    let engine = Arc::new(engine(
        ScriptedLlm::new(&[DOC1_GRAPH, DOC2_GRAPH]),
        store.clone(),
    ));

    let a = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.extract_and_merge("doc one", "c1").await })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.extract_and_merge("doc two", "c1").await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // The per-collection lock prevents a lost update or duplicate relation.
    assert_eq!(store.list("c1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_canonical_graph_reads_without_mutation() {
    let store = Arc::new(MemoryRelationStore::new());
    let engine = engine(ScriptedLlm::new(&[DOC1_GRAPH]), store.clone());

    assert!(engine.canonical_graph("c1").await.unwrap().is_empty());
    let merged = engine.extract_and_merge("doc one", "c1").await.unwrap();
    assert_eq!(engine.canonical_graph("c1").await.unwrap(), merged);
}
