//! Relation store trait.

use async_trait::async_trait;

use crate::error::WeftResult;
use crate::types::{ExtractedGraph, GraphRelation};

/// Persistence boundary for collection-scoped knowledge graphs.
///
/// The store itself is plain CRUD. The "at most one relation per
/// collection" invariant is enforced by callers, which repair violations by
/// keeping the earliest-created relation and deleting the rest.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// List all relations for a collection, ordered by creation time
    /// ascending.
    async fn list(&self, collection_id: &str) -> WeftResult<Vec<GraphRelation>>;

    /// Create a new relation holding the given graph.
    async fn create(
        &self,
        collection_id: &str,
        graph: &ExtractedGraph,
    ) -> WeftResult<GraphRelation>;

    /// Delete a relation by id. Deleting a missing relation is an error.
    async fn delete(&self, relation_id: &str) -> WeftResult<()>;
}
