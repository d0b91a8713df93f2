//! Error types for weft operations.
//!
//! This module provides the shared error hierarchy with structured error
//! codes for programmatic handling.

use thiserror::Error;

/// Result type alias for weft operations.
pub type WeftResult<T> = Result<T, WeftError>;

/// Main error type for all weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
    },

    /// LLM operation failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Relation store operation failed.
    #[error("Relation store error: {message}")]
    RelationStore {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A node inside a flow run failed.
    #[error("Flow error in node '{node}': {message}")]
    Flow {
        node: String,
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        code: ErrorCode,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmInvalidResponse,

    // Embedding (EMB_xxx)
    EmbConnectionFailed,
    EmbGenerationFailed,

    // Relation store (REL_xxx)
    RelConnectionFailed,
    RelOperationFailed,
    RelNotFound,

    // Flow (FLOW_xxx)
    FlowNodeFailed,
    FlowMissingNode,
    FlowRetriesExhausted,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseMissingField,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmInvalidResponse => "LLM_003",
            ErrorCode::EmbConnectionFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::RelConnectionFailed => "REL_001",
            ErrorCode::RelOperationFailed => "REL_002",
            ErrorCode::RelNotFound => "REL_003",
            ErrorCode::FlowNodeFailed => "FLOW_001",
            ErrorCode::FlowMissingNode => "FLOW_002",
            ErrorCode::FlowRetriesExhausted => "FLOW_003",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseMissingField => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl WeftError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create a relation store error.
    pub fn relation_store(message: impl Into<String>) -> Self {
        Self::RelationStore {
            message: message.into(),
            code: ErrorCode::RelOperationFailed,
            source: None,
        }
    }

    /// Create a flow error for the named node.
    pub fn flow(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Flow {
            node: node.into(),
            message: message.into(),
            code: ErrorCode::FlowNodeFailed,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::RelationStore { code, .. } => *code,
            Self::Flow { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::ValInvalidInput,
            Self::Io(_) => ErrorCode::Internal,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}
