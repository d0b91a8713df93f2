//! LLM-based knowledge-graph extraction.
//!
//! The extractor prompts a language model for a `{"nodes": [...],
//! "edges": [...]}` response and defensively recovers structured data from
//! free text: fenced code blocks are stripped, a `{...}` span is sliced out
//! of surrounding prose, and common JSON damage is repaired before giving
//! up. Extraction never fails past this boundary; ingestion treats "no
//! graph" as a valid, non-fatal outcome.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use weft_core::{
    ExtractedGraph, GenerationOptions, GraphEdge, GraphNode, GraphPrompts, Llm, Message,
    ResponseFormat,
};

/// Raw JSON structures for LLM response parsing.
/// Option fields and aliases tolerate the usual model output drift.
mod raw {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct RawNode {
        pub id: Option<String>,
        #[serde(alias = "name")]
        pub label: Option<String>,
        #[serde(default, rename = "type", alias = "node_type", alias = "nodeType")]
        pub node_type: Option<String>,
        pub title: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawEdge {
        #[serde(alias = "relation", alias = "relationship")]
        pub label: Option<String>,
        #[serde(alias = "from")]
        pub source: Option<String>,
        #[serde(alias = "to")]
        pub target: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawGraph {
        #[serde(default)]
        pub nodes: Vec<RawNode>,
        #[serde(default)]
        pub edges: Vec<RawEdge>,
    }
}

/// LLM-based graph extractor.
pub struct GraphExtractor {
    llm: Arc<dyn Llm>,
    prompts: Arc<GraphPrompts>,
}

impl GraphExtractor {
    /// Create a new graph extractor.
    pub fn new(llm: Arc<dyn Llm>, prompts: Arc<GraphPrompts>) -> Self {
        Self { llm, prompts }
    }

    /// Extract a node/edge graph from a document's full text.
    ///
    /// Empty input returns an empty graph without calling the model. Any
    /// failure (model error, malformed JSON, missing keys) is logged and
    /// converted to an empty graph.
    pub async fn extract(&self, full_text: &str) -> ExtractedGraph {
        let full_text = full_text.trim();
        if full_text.is_empty() {
            return ExtractedGraph::default();
        }

        let messages = vec![
            Message::system(self.prompts.extraction_system.clone()),
            Message::user(self.prompts.extraction_user(full_text)),
        ];
        let options = GenerationOptions {
            temperature: Some(0.0),
            response_format: Some(ResponseFormat::Json),
            ..Default::default()
        };

        let response = match self.llm.generate(&messages, Some(options)).await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "graph extraction LLM call failed");
                return ExtractedGraph::default();
            }
        };

        Self::parse_response(response.content_or_empty())
    }

    /// Parse an LLM response into an [`ExtractedGraph`].
    pub(crate) fn parse_response(content: &str) -> ExtractedGraph {
        let content = content.trim();
        if content.is_empty() {
            return ExtractedGraph::default();
        }

        let candidate = Self::slice_json_object(Self::strip_code_fence(content));

        let value: serde_json::Value = match serde_json::from_str(candidate) {
            Ok(value) => value,
            Err(error) => match Self::lenient_parse(candidate) {
                Some(value) => value,
                None => {
                    warn!(%error, "failed to parse extraction response");
                    return ExtractedGraph::default();
                }
            },
        };

        let object = match value.as_object() {
            Some(object) => object,
            None => {
                warn!("extraction response is not a JSON object");
                return ExtractedGraph::default();
            }
        };
        if !object.contains_key("nodes") || !object.contains_key("edges") {
            warn!("extraction response missing 'nodes' or 'edges' key");
            return ExtractedGraph::default();
        }

        let raw: raw::RawGraph = match serde_json::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "extraction response has unexpected shape");
                return ExtractedGraph::default();
            }
        };

        Self::convert(raw)
    }

    /// Strip a fenced code block, preferring one tagged as JSON.
    fn strip_code_fence(content: &str) -> &str {
        static JSON_FENCE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"```json\s*\n?([\s\S]*?)\n?```").unwrap());
        static ANY_FENCE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"```[a-zA-Z0-9]*\s*\n?([\s\S]*?)\n?```").unwrap());

        for fence in [&*JSON_FENCE, &*ANY_FENCE] {
            if let Some(captures) = fence.captures(content) {
                if let Some(inner) = captures.get(1) {
                    return inner.as_str().trim();
                }
            }
        }
        content
    }

    /// Slice from the first `{` to the last `}` when the candidate is not
    /// already a well-formed object span.
    fn slice_json_object(candidate: &str) -> &str {
        let candidate = candidate.trim();
        if candidate.starts_with('{') && candidate.ends_with('}') {
            return candidate;
        }
        match (candidate.find('{'), candidate.rfind('}')) {
            (Some(start), Some(end)) if start < end => &candidate[start..=end],
            _ => candidate,
        }
    }

    /// Repair common JSON damage before giving up.
    fn lenient_parse(candidate: &str) -> Option<serde_json::Value> {
        let repaired = candidate
            .replace('\'', "\"")
            .replace(",]", "]")
            .replace(",}", "}");
        serde_json::from_str(&repaired).ok()
    }

    /// Convert raw entries to typed ones, dropping invalid entries at the
    /// boundary so malformed nodes and edges never flow downstream.
    fn convert(raw: raw::RawGraph) -> ExtractedGraph {
        let mut nodes = Vec::new();
        let mut seen_ids = std::collections::HashSet::new();
        for raw_node in raw.nodes {
            let label = match raw_node.label.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => label.to_string(),
                _ => {
                    warn!("dropping extracted node without a label");
                    continue;
                }
            };
            let id = match raw_node.id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => derive_node_id(&label),
            };
            if !seen_ids.insert(id.clone()) {
                warn!(id = %id, "dropping extracted node with duplicate id");
                continue;
            }
            let mut node = GraphNode::new(
                id,
                label,
                raw_node.node_type.unwrap_or_default(),
            );
            if let Some(title) = raw_node.title.filter(|t| !t.trim().is_empty()) {
                node = node.with_title(title.trim().to_string());
            }
            if let Some(description) = raw_node.description.filter(|d| !d.trim().is_empty()) {
                node = node.with_description(description.trim().to_string());
            }
            nodes.push(node);
        }

        let mut edges = Vec::new();
        for raw_edge in raw.edges {
            let (source, target) = match (
                raw_edge.source.as_deref().map(str::trim),
                raw_edge.target.as_deref().map(str::trim),
            ) {
                (Some(source), Some(target)) if !source.is_empty() && !target.is_empty() => {
                    (source.to_string(), target.to_string())
                }
                _ => {
                    warn!("dropping extracted edge without source/target");
                    continue;
                }
            };
            let label = raw_edge
                .label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or("related_to")
                .to_string();
            edges.push(GraphEdge::new(label, source, target));
        }

        ExtractedGraph::new(nodes, edges)
    }
}

/// Derive a node id for an extracted node the model left unnamed.
fn derive_node_id(label: &str) -> String {
    format!("n_{}", label.to_lowercase().replace(' ', "_"))
}
