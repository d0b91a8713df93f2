//! weft-graph - knowledge-graph extraction and consolidation.
//!
//! Turns unstructured document text into a canonical per-collection
//! knowledge graph:
//!
//! 1. [`GraphExtractor`] prompts an LLM for a raw node/edge graph and
//!    defensively parses the response. Extraction never fails past its
//!    boundary; a bad response becomes an empty graph.
//! 2. [`GraphMerger`] consolidates raw graphs by clustering near-duplicate
//!    entity labels with embedding similarity and resolving each cluster to
//!    one canonical node.
//! 3. [`GraphEngine`] orchestrates extract → merge → replace against a
//!    [`RelationStore`](weft_core::RelationStore), holding a per-collection
//!    lock and enforcing the at-most-one-relation invariant.

mod engine;
mod extractor;
mod merger;
mod store;

pub use engine::GraphEngine;
pub use extractor::GraphExtractor;
pub use merger::GraphMerger;
pub use store::MemoryRelationStore;
