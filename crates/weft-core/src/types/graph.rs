//! Knowledge-graph data types.
//!
//! An [`ExtractedGraph`] is the unit of exchange between extraction,
//! merging, and storage: created fresh per extraction call, consumed and
//! discarded once merged or stored. A [`GraphRelation`] is the persisted
//! container of one collection's consolidated graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node in an extracted knowledge graph.
///
/// `id` is unique within one [`ExtractedGraph`]; `label` is the free-text
/// entity name that acts as the join key for canonicalization and need not
/// be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node id, unique within one extracted graph.
    pub id: String,
    /// Free-text entity name.
    pub label: String,
    /// Category string (e.g. "person", "concept").
    #[serde(default, rename = "type")]
    pub node_type: String,
    /// Optional short title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Original labels folded into this node by the merger, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl GraphNode {
    /// Create a new graph node.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type: node_type.into(),
            title: None,
            description: None,
            aliases: Vec::new(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A directed, labeled edge between two nodes of an extracted graph.
///
/// `source` and `target` reference node ids. An edge whose endpoint ids are
/// absent from the merged node set is meaningless and is dropped by the
/// merger, never fabricated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Relation name (e.g. "works_at").
    pub label: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
}

impl GraphEdge {
    /// Create a new graph edge.
    pub fn new(
        label: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// An extracted node/edge graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedGraph {
    /// Graph nodes.
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// Graph edges.
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl ExtractedGraph {
    /// Create a graph from nodes and edges.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Check if the graph has no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Get the node count.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the edge count.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// The persisted knowledge graph attached to one collection.
///
/// A collection has at most one relation; callers of the relation store
/// enforce this invariant and repair violations by keeping the
/// earliest-created row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRelation {
    /// Relation id.
    pub id: String,
    /// Owning collection id.
    pub collection_id: String,
    /// The consolidated graph.
    pub graph: ExtractedGraph,
    /// Creation timestamp, used to pick the survivor when duplicates exist.
    pub created_at: DateTime<Utc>,
}
