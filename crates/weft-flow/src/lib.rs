//! weft-flow - directed workflow-graph interpreter.
//!
//! A [`Flow`] is a directed graph of [`FlowNode`]s with transitions keyed
//! by `(source node, action)`. Each node performs three phases per visit:
//! `prepare` reads from the per-run [`FlowContext`], `execute` does the
//! (retryable) work, and `finalize` writes results back and returns the
//! [`Action`] selecting the next node. A flow is compiled once and shared
//! across concurrent runs; nodes hold configuration only, and all per-run
//! state lives in the context.
//!
//! # Example
//!
//! ```ignore
//! let flow = FlowBuilder::new()
//!     .node(classify)
//!     .node(generate)
//!     .start("classify")
//!     .on("classify", Action::label("answer-directly"), "generate")
//!     .build()?;
//!
//! let mut ctx = FlowContext::new();
//! ctx.insert("query", serde_json::json!("hello"));
//! let final_action = flow.run(&mut ctx).await?;
//! ```

mod action;
mod context;
mod flow;
mod node;

pub use action::Action;
pub use context::FlowContext;
pub use flow::{Flow, FlowBuilder};
pub use node::{FlowNode, RetryPolicy};
