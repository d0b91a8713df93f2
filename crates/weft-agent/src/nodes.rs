//! Flow nodes for the answer pipeline.
//!
//! Every node is configuration-only; per-turn state flows through the
//! context under these keys: `query`, `session_id`, `intent`,
//! `query_embedding`, `last_context`, `retrieved_context`, `answer`.
//!
//! Missing-prerequisite policy, per node: `query` is required (classify and
//! embed fail without it); everything downstream soft-fails, continuing
//! with degraded output rather than aborting the turn.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use weft_core::{
    Embedder, GenerationOptions, GraphPrompts, Llm, Message, ResponseFormat, WeftError,
    WeftResult,
};
use weft_flow::{Action, FlowContext, FlowNode, RetryPolicy};

use crate::intent::{parse_intent, Intent};
use crate::store::{Retriever, TurnStore};

const LLM_RETRIES: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    wait: Duration::from_millis(200),
};

fn required_str(ctx: &FlowContext, key: &str) -> WeftResult<String> {
    ctx.get_str(key)
        .map(str::to_string)
        .ok_or_else(|| WeftError::validation(format!("context is missing '{}'", key)))
}

/// Classifies the user's query into an [`Intent`] and branches on it.
///
/// Fallback policy: an unusable or failed classification degrades to
/// answering directly, never aborts the turn.
pub struct ClassifyIntentNode {
    llm: Arc<dyn Llm>,
    prompts: Arc<GraphPrompts>,
}

impl ClassifyIntentNode {
    pub fn new(llm: Arc<dyn Llm>, prompts: Arc<GraphPrompts>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl FlowNode for ClassifyIntentNode {
    fn name(&self) -> &str {
        "classify_intent"
    }

    async fn prepare(&self, ctx: &FlowContext) -> WeftResult<Value> {
        Ok(json!(required_str(ctx, "query")?))
    }

    async fn execute(&self, input: &Value) -> WeftResult<Value> {
        let messages = vec![
            Message::system(self.prompts.classification_prompt(&Intent::all_labels())),
            Message::user(input.as_str().unwrap_or_default()),
        ];
        let options = GenerationOptions {
            temperature: Some(0.0),
            response_format: Some(ResponseFormat::Json),
            ..Default::default()
        };
        let response = self.llm.generate(&messages, Some(options)).await?;
        Ok(json!(response.content_or_empty()))
    }

    async fn finalize(
        &self,
        ctx: &mut FlowContext,
        _input: Value,
        result: Value,
    ) -> WeftResult<Action> {
        let intent = parse_intent(result.as_str().unwrap_or_default());
        ctx.insert("intent", json!(intent.as_str()));
        Ok(Action::label(intent.as_str()))
    }

    fn retry_policy(&self) -> RetryPolicy {
        LLM_RETRIES
    }

    fn fallback(&self, _input: &Value, _error: &WeftError) -> Option<Value> {
        // An empty classifier response parses to Intent::Direct.
        Some(json!(""))
    }
}

/// Embeds the query for retrieval.
///
/// Fallback policy: an embedding failure stores a null vector, which the
/// retrieve node treats as "no context available".
pub struct EmbedQueryNode {
    embedder: Arc<dyn Embedder>,
}

impl EmbedQueryNode {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl FlowNode for EmbedQueryNode {
    fn name(&self) -> &str {
        "embed_query"
    }

    async fn prepare(&self, ctx: &FlowContext) -> WeftResult<Value> {
        Ok(json!(required_str(ctx, "query")?))
    }

    async fn execute(&self, input: &Value) -> WeftResult<Value> {
        let embedding = self
            .embedder
            .embed(input.as_str().unwrap_or_default())
            .await?;
        Ok(json!(embedding))
    }

    async fn finalize(
        &self,
        ctx: &mut FlowContext,
        _input: Value,
        result: Value,
    ) -> WeftResult<Action> {
        ctx.insert("query_embedding", result);
        Ok(Action::Default)
    }

    fn retry_policy(&self) -> RetryPolicy {
        LLM_RETRIES
    }

    fn fallback(&self, _input: &Value, _error: &WeftError) -> Option<Value> {
        Some(Value::Null)
    }
}

/// Retrieves document chunks for the query embedding.
///
/// A missing or null embedding is a soft failure: the node stores an empty
/// context and the pipeline continues with degraded output.
pub struct RetrieveNode {
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl RetrieveNode {
    pub fn new(retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self { retriever, top_k }
    }
}

#[async_trait]
impl FlowNode for RetrieveNode {
    fn name(&self) -> &str {
        "retrieve"
    }

    async fn prepare(&self, ctx: &FlowContext) -> WeftResult<Value> {
        Ok(ctx.get("query_embedding").cloned().unwrap_or(Value::Null))
    }

    async fn execute(&self, input: &Value) -> WeftResult<Value> {
        if input.is_null() {
            warn!("no query embedding available, retrieving nothing");
            return Ok(json!([]));
        }
        let embedding: Vec<f32> = serde_json::from_value(input.clone())?;
        let chunks = self.retriever.retrieve(&embedding, self.top_k).await?;
        let texts: Vec<String> = chunks.into_iter().map(|c| c.text).collect();
        Ok(json!(texts))
    }

    async fn finalize(
        &self,
        ctx: &mut FlowContext,
        _input: Value,
        result: Value,
    ) -> WeftResult<Action> {
        let texts: Vec<String> = serde_json::from_value(result).unwrap_or_default();
        ctx.insert("retrieved_context", json!(texts.join("\n\n")));
        Ok(Action::Default)
    }
}

/// Reuses the previous turn's context instead of retrieving fresh chunks.
///
/// An absent `last_context` is a soft failure: the context comes up empty
/// and generation proceeds without it.
pub struct ReuseContextNode;

#[async_trait]
impl FlowNode for ReuseContextNode {
    fn name(&self) -> &str {
        "reuse_context"
    }

    async fn prepare(&self, ctx: &FlowContext) -> WeftResult<Value> {
        Ok(json!(ctx.get_str("last_context").unwrap_or_default()))
    }

    async fn execute(&self, input: &Value) -> WeftResult<Value> {
        Ok(input.clone())
    }

    async fn finalize(
        &self,
        ctx: &mut FlowContext,
        _input: Value,
        result: Value,
    ) -> WeftResult<Action> {
        ctx.insert("retrieved_context", result);
        Ok(Action::Default)
    }
}

/// Generates the answer from the query and whatever context the upstream
/// path produced.
pub struct GenerateAnswerNode {
    llm: Arc<dyn Llm>,
    prompts: Arc<GraphPrompts>,
}

impl GenerateAnswerNode {
    pub fn new(llm: Arc<dyn Llm>, prompts: Arc<GraphPrompts>) -> Self {
        Self { llm, prompts }
    }
}

const DEGRADED_ANSWER: &str =
    "I wasn't able to generate an answer just now. Please try again.";

#[async_trait]
impl FlowNode for GenerateAnswerNode {
    fn name(&self) -> &str {
        "generate_answer"
    }

    async fn prepare(&self, ctx: &FlowContext) -> WeftResult<Value> {
        Ok(json!({
            "query": ctx.get_str("query").unwrap_or_default(),
            "context": ctx.get_str("retrieved_context").unwrap_or_default(),
        }))
    }

    async fn execute(&self, input: &Value) -> WeftResult<Value> {
        let query = input["query"].as_str().unwrap_or_default();
        let context = input["context"].as_str().unwrap_or_default();
        let messages = vec![
            Message::system(self.prompts.answer_system.clone()),
            Message::user(self.prompts.answer_user(query, context)),
        ];
        let response = self.llm.generate(&messages, None).await?;
        let answer = response.content_or_empty().trim().to_string();
        if answer.is_empty() {
            return Err(WeftError::llm("empty completion"));
        }
        Ok(json!(answer))
    }

    async fn finalize(
        &self,
        ctx: &mut FlowContext,
        _input: Value,
        result: Value,
    ) -> WeftResult<Action> {
        ctx.insert("answer", result);
        Ok(Action::Default)
    }

    fn retry_policy(&self) -> RetryPolicy {
        LLM_RETRIES
    }

    fn fallback(&self, _input: &Value, _error: &WeftError) -> Option<Value> {
        Some(json!(DEGRADED_ANSWER))
    }
}

/// Persists the completed turn into the session history.
pub struct PersistTurnNode {
    turns: Arc<dyn TurnStore>,
}

impl PersistTurnNode {
    pub fn new(turns: Arc<dyn TurnStore>) -> Self {
        Self { turns }
    }
}

#[async_trait]
impl FlowNode for PersistTurnNode {
    fn name(&self) -> &str {
        "persist_turn"
    }

    async fn prepare(&self, ctx: &FlowContext) -> WeftResult<Value> {
        Ok(json!({
            "session_id": ctx.get_str("session_id").unwrap_or("default"),
            "query": ctx.get_str("query").unwrap_or_default(),
            "answer": ctx.get_str("answer").unwrap_or_default(),
        }))
    }

    // Appends are not idempotent, so this node keeps the single-attempt
    // default retry policy.
    async fn execute(&self, input: &Value) -> WeftResult<Value> {
        let session_id = input["session_id"].as_str().unwrap_or("default");
        self.turns
            .append(
                session_id,
                weft_core::MessageRole::User,
                input["query"].as_str().unwrap_or_default(),
            )
            .await?;
        self.turns
            .append(
                session_id,
                weft_core::MessageRole::Assistant,
                input["answer"].as_str().unwrap_or_default(),
            )
            .await?;
        Ok(json!("persisted"))
    }

    async fn finalize(
        &self,
        _ctx: &mut FlowContext,
        _input: Value,
        _result: Value,
    ) -> WeftResult<Action> {
        Ok(Action::Default)
    }
}
