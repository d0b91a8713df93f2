//! Collaborator traits.
//!
//! Text completion, embedding, and graph persistence are external
//! collaborators; these traits are their interface boundary. Providers live
//! outside this workspace.

mod embedder;
mod llm;
mod relation_store;

pub use embedder::Embedder;
pub use llm::{GenerationOptions, Llm, LlmResponse, ResponseFormat, TokenUsage};
pub use relation_store::RelationStore;
