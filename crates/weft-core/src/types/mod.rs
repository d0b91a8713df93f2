//! Core type definitions.

mod graph;
mod message;

pub use graph::{ExtractedGraph, GraphEdge, GraphNode, GraphRelation};
pub use message::{Message, MessageRole};
