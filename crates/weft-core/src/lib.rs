//! weft-core - Core library for weft.
//!
//! This crate provides the shared types, collaborator traits, error
//! hierarchy, and configuration used by the weft graph-consolidation and
//! flow-execution crates.
//!
//! # Example
//!
//! ```ignore
//! use weft_core::{WeftConfig, GraphPrompts};
//! use weft_graph::GraphEngine;
//!
//! let config = WeftConfig::default();
//! let prompts = Arc::new(GraphPrompts::default());
//! let engine = GraphEngine::new(llm, embedder, store, prompts, config.merge);
//!
//! let merged = engine.extract_and_merge(&full_text, "collection-1").await?;
//! ```

pub mod config;
pub mod error;
pub mod prompts;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{EmbedderConfig, LlmConfig, MergeConfig, WeftConfig};
pub use error::{ErrorCode, WeftError, WeftResult};
pub use prompts::GraphPrompts;
pub use traits::{Embedder, GenerationOptions, Llm, LlmResponse, RelationStore, ResponseFormat};
pub use types::{
    ExtractedGraph, GraphEdge, GraphNode, GraphRelation, Message, MessageRole,
};
