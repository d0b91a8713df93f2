//! weft-agent - the online query path as a compiled flow.
//!
//! One user turn runs through a diamond-shaped [`Flow`](weft_flow::Flow):
//! intent classification fans out to one of three sub-paths (embed and
//! retrieve fresh context, reuse the previous turn's context, or answer
//! directly), all of which converge on answer generation and then turn
//! persistence. The flow is built once via [`answer_flow`] and shared
//! across concurrent sessions; per-turn state lives in the
//! [`FlowContext`](weft_flow::FlowContext).

mod flow;
mod intent;
mod nodes;
mod store;

pub use flow::{answer_flow, seed_context};
pub use intent::Intent;
pub use nodes::{
    ClassifyIntentNode, EmbedQueryNode, GenerateAnswerNode, PersistTurnNode, RetrieveNode,
    ReuseContextNode,
};
pub use store::{MemoryTurnStore, RetrievedChunk, Retriever, Turn, TurnStore};
