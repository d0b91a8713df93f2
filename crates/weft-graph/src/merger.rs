//! Graph consolidation via label similarity clustering.
//!
//! The merger folds any number of raw graphs into one canonical graph:
//! labels are normalized, embedded, and clustered by cosine similarity;
//! each connected component becomes one merged node, and edges are remapped
//! onto the merged node set (or dropped when an endpoint cannot resolve).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::unionfind::UnionFind;
use tracing::{debug, info};

use weft_core::{
    Embedder, ExtractedGraph, GraphEdge, GraphNode, MergeConfig, WeftResult,
};

/// Embedding-based graph merger.
pub struct GraphMerger {
    embedder: Arc<dyn Embedder>,
    config: MergeConfig,
}

impl GraphMerger {
    /// Create a new graph merger.
    pub fn new(embedder: Arc<dyn Embedder>, config: MergeConfig) -> Self {
        Self { embedder, config }
    }

    /// Get the merge config.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Consolidate the input graphs into one canonical graph.
    ///
    /// The only failure path is the embedding collaborator; every data
    /// inconsistency (empty labels, unresolvable edge endpoints) is
    /// recovered locally.
    pub async fn merge(&self, graphs: &[ExtractedGraph]) -> WeftResult<ExtractedGraph> {
        // Label extraction: one representative node per distinct label,
        // last-writer-wins. Node ids are only unique within one input
        // graph, so each graph gets its own id -> label map for edge
        // resolution.
        let mut label_map: HashMap<String, GraphNode> = HashMap::new();
        let mut id_maps: Vec<HashMap<String, String>> = Vec::with_capacity(graphs.len());
        for graph in graphs {
            let mut id_to_label: HashMap<String, String> = HashMap::new();
            for node in &graph.nodes {
                let label = node.label.trim();
                if label.is_empty() {
                    debug!(id = %node.id, "skipping node with empty label");
                    continue;
                }
                label_map.insert(label.to_string(), node.clone());
                id_to_label.insert(node.id.clone(), label.to_string());
            }
            id_maps.push(id_to_label);
        }

        // Normalization: lowercase + trim for comparison, remembering which
        // original labels share each normalized form.
        let mut norm_to_originals: HashMap<String, Vec<String>> = HashMap::new();
        for label in label_map.keys() {
            norm_to_originals
                .entry(normalize_label(label))
                .or_default()
                .push(label.clone());
        }
        let mut norms: Vec<String> = norm_to_originals.keys().cloned().collect();
        norms.sort();

        // Similarity clustering + connected components. With fewer than two
        // distinct normalized labels there is nothing to compare, so the
        // embedder is not called.
        let mut components = UnionFind::<usize>::new(norms.len());
        if norms.len() >= 2 {
            let vectors = self.embedder.embed_batch(&norms).await?;
            let k = norms.len().min(self.config.max_neighbors);
            for i in 0..norms.len() {
                let mut neighbors: Vec<(usize, f32)> = (0..norms.len())
                    .filter(|&j| j != i)
                    .map(|j| (j, cosine_similarity(&vectors[i], &vectors[j])))
                    .collect();
                neighbors.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
                });
                for &(j, similarity) in neighbors.iter().take(k) {
                    if similarity >= self.config.similarity_threshold {
                        components.union(i, j);
                    }
                }
            }
        }

        // Group normalized labels by component root.
        let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..norms.len() {
            clusters.entry(components.find(i)).or_default().push(i);
        }

        // Canonical selection + node materialization.
        let mut label_to_merged: HashMap<String, String> = HashMap::new();
        let mut merged_nodes = Vec::new();
        for members in clusters.values() {
            let mut originals: Vec<String> = members
                .iter()
                .flat_map(|&i| norm_to_originals[&norms[i]].iter().cloned())
                .collect();
            originals.sort();

            let canonical = select_canonical(&originals);
            let representative = &label_map[&canonical];
            let merged_id = merged_node_id(&canonical);

            let mut node = GraphNode::new(
                merged_id.clone(),
                canonical.clone(),
                representative.node_type.clone(),
            );
            node.title = representative.title.clone();
            node.description = representative.description.clone();
            node.aliases = originals.clone();
            merged_nodes.push(node);

            for original in originals {
                label_to_merged.insert(original, merged_id.clone());
            }
        }
        merged_nodes.sort_by(|a, b| a.label.cmp(&b.label));

        // Edge remapping and dedup: both endpoints must resolve through
        // the owning graph's id -> label map, then label -> merged node;
        // exact duplicates are dropped.
        let mut merged_edges = Vec::new();
        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        for (graph, id_to_label) in graphs.iter().zip(&id_maps) {
            for edge in &graph.edges {
                let resolved = id_to_label
                    .get(&edge.source)
                    .and_then(|l| label_to_merged.get(l))
                    .zip(
                        id_to_label
                            .get(&edge.target)
                            .and_then(|l| label_to_merged.get(l)),
                    );
                let (source, target) = match resolved {
                    Some((source, target)) => (source.clone(), target.clone()),
                    None => {
                        debug!(
                            source = %edge.source,
                            target = %edge.target,
                            "dropping edge with unresolved endpoint"
                        );
                        continue;
                    }
                };
                if seen.insert((source.clone(), target.clone(), edge.label.clone())) {
                    merged_edges.push(GraphEdge::new(edge.label.clone(), source, target));
                }
            }
        }

        info!(
            input_graphs = graphs.len(),
            nodes = merged_nodes.len(),
            edges = merged_edges.len(),
            "graph merge complete"
        );
        Ok(ExtractedGraph::new(merged_nodes, merged_edges))
    }
}

/// Normalize a label for similarity comparison.
fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Deterministic node id for a canonical label.
fn merged_node_id(canonical: &str) -> String {
    format!("merged_{}", canonical.to_lowercase().replace(' ', "_"))
}

/// Pick the canonical label of a cluster: most space-separated words, then
/// longest string, then lexicographically smallest.
fn select_canonical(originals: &[String]) -> String {
    originals
        .iter()
        .max_by(|a, b| {
            let words_a = a.split_whitespace().count();
            let words_b = b.split_whitespace().count();
            words_a
                .cmp(&words_b)
                .then(a.len().cmp(&b.len()))
                .then(b.cmp(a))
        })
        .cloned()
        .unwrap_or_default()
}

/// Cosine similarity between two vectors; zero-magnitude vectors compare
/// as dissimilar.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
