//! Configuration system for weft.

use serde::{Deserialize, Serialize};

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model name/identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-nano-2025-04-14".to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            api_key: None,
            base_url: None,
        }
    }
}

/// Embedder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Model name/identifier.
    pub model: String,
    /// Embedding dimensions.
    pub embedding_dims: usize,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            embedding_dims: 1536,
            api_key: None,
            base_url: None,
        }
    }
}

/// Configuration for graph merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Similarity threshold for clustering labels (0.0 - 1.0). Higher
    /// values require more similar labels to merge. Default: 0.85
    pub similarity_threshold: f32,
    /// Maximum nearest neighbors considered per label. Default: 50
    pub max_neighbors: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            max_neighbors: 50,
        }
    }
}

impl MergeConfig {
    /// Create a merge config with a custom threshold.
    pub fn with_threshold(similarity_threshold: f32) -> Self {
        Self {
            similarity_threshold,
            ..Default::default()
        }
    }

    /// Set the neighbor cap.
    pub fn with_max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = max_neighbors.max(1);
        self
    }
}

/// Main weft configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    /// LLM configuration.
    pub llm: LlmConfig,
    /// Embedder configuration.
    pub embedder: EmbedderConfig,
    /// Merge configuration.
    pub merge: MergeConfig,
}
