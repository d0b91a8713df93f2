//! End-to-end runs of the answer flow with scripted collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use weft_agent::{answer_flow, seed_context, MemoryTurnStore, RetrievedChunk, Retriever, TurnStore};
use weft_core::{
    GenerationOptions, GraphPrompts, Llm, LlmResponse, Message, MessageRole, WeftError,
    WeftResult,
};
use weft_core::Embedder;

/// Pops one canned response per generate call; errors when exhausted.
struct ScriptedLlm {
    responses: Mutex<VecDeque<&'static str>>,
}

impl ScriptedLlm {
    fn new(responses: Vec<&'static str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> WeftResult<LlmResponse> {
        let mut responses = self.responses.lock().unwrap();
        match responses.pop_front() {
            Some(content) => Ok(LlmResponse {
                content: Some(content.to_string()),
                usage: None,
            }),
            None => Err(WeftError::llm("script exhausted")),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> WeftResult<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// Returns canned chunks and counts invocations.
struct CountingRetriever {
    chunks: Vec<&'static str>,
    calls: AtomicUsize,
}

impl CountingRetriever {
    fn new(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Retriever for CountingRetriever {
    async fn retrieve(&self, _embedding: &[f32], top_k: usize) -> WeftResult<Vec<RetrievedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .chunks
            .iter()
            .take(top_k)
            .map(|text| RetrievedChunk {
                text: text.to_string(),
                score: 0.9,
            })
            .collect())
    }
}

#[tokio::test]
async fn test_new_question_routes_through_retrieval() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        r#"{"intent": "fetch-then-retrieve"}"#,
        "Rust is a systems programming language.",
    ]));
    let retriever = Arc::new(CountingRetriever::new(vec![
        "Rust emphasizes memory safety.",
        "Cargo is Rust's build tool.",
    ]));
    let turns = Arc::new(MemoryTurnStore::new());
    let flow = answer_flow(
        llm,
        Arc::new(FixedEmbedder),
        retriever.clone(),
        turns.clone(),
        Arc::new(GraphPrompts::default()),
        5,
    )
    .unwrap();

    let mut ctx = seed_context("what is rust?", "s1");
    flow.run(&mut ctx).await.unwrap();

    assert_eq!(
        ctx.visited(),
        [
            "classify_intent",
            "embed_query",
            "retrieve",
            "generate_answer",
            "persist_turn",
        ]
    );
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    assert!(ctx
        .get_str("retrieved_context")
        .unwrap()
        .contains("memory safety"));
    assert_eq!(
        ctx.get_str("answer"),
        Some("Rust is a systems programming language.")
    );

    let history = turns.history("s1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[0].content, "what is rust?");
    assert_eq!(history[1].role, MessageRole::Assistant);
}

#[tokio::test]
async fn test_follow_up_reuses_context_without_retrieval() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        r#"{"intent": "reuse-last-context"}"#,
        "As mentioned, Cargo handles builds.",
    ]));
    let retriever = Arc::new(CountingRetriever::new(vec!["unused"]));
    let turns = Arc::new(MemoryTurnStore::new());
    let flow = answer_flow(
        llm,
        Arc::new(FixedEmbedder),
        retriever.clone(),
        turns.clone(),
        Arc::new(GraphPrompts::default()),
        5,
    )
    .unwrap();

    let mut ctx = seed_context("and the build tool?", "s1");
    ctx.insert(
        "last_context",
        serde_json::json!("Cargo is Rust's build tool."),
    );
    flow.run(&mut ctx).await.unwrap();

    assert_eq!(
        ctx.visited(),
        [
            "classify_intent",
            "reuse_context",
            "generate_answer",
            "persist_turn",
        ]
    );
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        ctx.get_str("retrieved_context"),
        Some("Cargo is Rust's build tool.")
    );
    assert_eq!(
        ctx.get_str("answer"),
        Some("As mentioned, Cargo handles builds.")
    );
}

#[tokio::test]
async fn test_direct_answer_skips_context_entirely() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        r#"{"intent": "answer-directly"}"#,
        "Hello! How can I help?",
    ]));
    let retriever = Arc::new(CountingRetriever::new(vec!["unused"]));
    let turns = Arc::new(MemoryTurnStore::new());
    let flow = answer_flow(
        llm,
        Arc::new(FixedEmbedder),
        retriever.clone(),
        turns.clone(),
        Arc::new(GraphPrompts::default()),
        5,
    )
    .unwrap();

    let mut ctx = seed_context("hi there", "s2");
    flow.run(&mut ctx).await.unwrap();

    assert_eq!(
        ctx.visited(),
        ["classify_intent", "generate_answer", "persist_turn"]
    );
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    assert_eq!(ctx.get_str("answer"), Some("Hello! How can I help?"));
}

#[tokio::test]
async fn test_classifier_garbage_falls_back_to_direct() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        "I could not decide on an intent, sorry!",
        "Answering anyway.",
    ]));
    let turns = Arc::new(MemoryTurnStore::new());
    let flow = answer_flow(
        llm,
        Arc::new(FixedEmbedder),
        Arc::new(CountingRetriever::new(vec![])),
        turns.clone(),
        Arc::new(GraphPrompts::default()),
        5,
    )
    .unwrap();

    let mut ctx = seed_context("unparseable case", "s3");
    flow.run(&mut ctx).await.unwrap();

    assert_eq!(ctx.get_str("intent"), Some("answer-directly"));
    assert_eq!(
        ctx.visited(),
        ["classify_intent", "generate_answer", "persist_turn"]
    );
}

#[tokio::test]
async fn test_exhausted_llm_degrades_instead_of_failing() {
    // Only the classification response is scripted; answer generation
    // exhausts its retries and must substitute the degraded answer.
    let llm = Arc::new(ScriptedLlm::new(vec![r#"{"intent": "answer-directly"}"#]));
    let turns = Arc::new(MemoryTurnStore::new());
    let flow = answer_flow(
        llm,
        Arc::new(FixedEmbedder),
        Arc::new(CountingRetriever::new(vec![])),
        turns.clone(),
        Arc::new(GraphPrompts::default()),
        5,
    )
    .unwrap();

    let mut ctx = seed_context("doomed question", "s4");
    flow.run(&mut ctx).await.unwrap();

    let answer = ctx.get_str("answer").unwrap();
    assert!(answer.contains("try again"));

    // The degraded turn is still persisted.
    let history = turns.history("s4").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, answer);
}

#[tokio::test]
async fn test_missing_query_is_rejected() {
    let llm = Arc::new(ScriptedLlm::new(vec![]));
    let flow = answer_flow(
        llm,
        Arc::new(FixedEmbedder),
        Arc::new(CountingRetriever::new(vec![])),
        Arc::new(MemoryTurnStore::new()),
        Arc::new(GraphPrompts::default()),
        5,
    )
    .unwrap();

    let mut ctx = weft_flow::FlowContext::new();
    let err = flow.run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, WeftError::Validation { .. }));
}
