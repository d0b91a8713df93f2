//! Assembly of the answer flow.

use std::sync::Arc;

use serde_json::json;

use weft_core::{Embedder, GraphPrompts, Llm, WeftResult};
use weft_flow::{Action, Flow, FlowBuilder, FlowContext};

use crate::intent::Intent;
use crate::nodes::{
    ClassifyIntentNode, EmbedQueryNode, GenerateAnswerNode, PersistTurnNode, RetrieveNode,
    ReuseContextNode,
};
use crate::store::{Retriever, TurnStore};

/// Build the answer flow.
///
/// Classification fans out into three paths which all converge on answer
/// generation:
///
/// ```text
/// classify_intent -(fetch-then-retrieve)-> embed_query -> retrieve ---+
///                 -(reuse-last-context)--> reuse_context -------------+-> generate_answer -> persist_turn
///                 -(answer-directly)----------------------------------+
/// ```
///
/// The returned flow is immutable and safe to share across concurrent
/// turns. `top_k` bounds how many chunks the retrieve step asks for.
pub fn answer_flow(
    llm: Arc<dyn Llm>,
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    turns: Arc<dyn TurnStore>,
    prompts: Arc<GraphPrompts>,
    top_k: usize,
) -> WeftResult<Flow> {
    FlowBuilder::new()
        .node(Arc::new(ClassifyIntentNode::new(llm.clone(), prompts.clone())))
        .node(Arc::new(EmbedQueryNode::new(embedder)))
        .node(Arc::new(RetrieveNode::new(retriever, top_k)))
        .node(Arc::new(ReuseContextNode))
        .node(Arc::new(GenerateAnswerNode::new(llm, prompts)))
        .node(Arc::new(PersistTurnNode::new(turns)))
        .start("classify_intent")
        .on(
            "classify_intent",
            Action::label(Intent::NewQuestion.as_str()),
            "embed_query",
        )
        .on(
            "classify_intent",
            Action::label(Intent::FollowUp.as_str()),
            "reuse_context",
        )
        .on(
            "classify_intent",
            Action::label(Intent::Direct.as_str()),
            "generate_answer",
        )
        .edge("embed_query", "retrieve")
        .edge("retrieve", "generate_answer")
        .edge("reuse_context", "generate_answer")
        .edge("generate_answer", "persist_turn")
        .build()
}

/// Seed a per-turn context with the user's query and session.
pub fn seed_context(query: &str, session_id: &str) -> FlowContext {
    let mut ctx = FlowContext::new();
    ctx.insert("query", json!(query));
    ctx.insert("session_id", json!(session_id));
    ctx
}
