//! Prompt templates for graph extraction and the agent flow.
//!
//! Templates are an explicit dependency: construct [`GraphPrompts`] once at
//! startup, share it behind an `Arc`, and treat it as read-only thereafter.

/// Prompt provider for LLM-facing operations.
#[derive(Debug, Clone)]
pub struct GraphPrompts {
    /// System prompt for graph extraction.
    pub extraction_system: String,
    /// System prompt template for intent classification. `{intents}` is
    /// replaced with the comma-separated intent labels.
    pub classification_system: String,
    /// System prompt for answer generation.
    pub answer_system: String,
}

impl Default for GraphPrompts {
    fn default() -> Self {
        Self {
            extraction_system: DEFAULT_EXTRACTION_SYSTEM.to_string(),
            classification_system: DEFAULT_CLASSIFICATION_SYSTEM.to_string(),
            answer_system: DEFAULT_ANSWER_SYSTEM.to_string(),
        }
    }
}

impl GraphPrompts {
    /// Build the user message for graph extraction.
    pub fn extraction_user(&self, text: &str) -> String {
        format!(
            "Extract the knowledge graph from this document:\n\n{}",
            text
        )
    }

    /// Render the classification prompt for the given intent labels.
    pub fn classification_prompt(&self, intents: &[&str]) -> String {
        self.classification_system
            .replace("{intents}", &intents.join(", "))
    }

    /// Build the user message for answer generation.
    pub fn answer_user(&self, query: &str, context: &str) -> String {
        if context.trim().is_empty() {
            format!("Question: {}", query)
        } else {
            format!("Context:\n{}\n\nQuestion: {}", context, query)
        }
    }
}

const DEFAULT_EXTRACTION_SYSTEM: &str = r#"You are a knowledge graph extraction system. Extract entities and their relationships from the document.

Output JSON in this exact format:
{
  "nodes": [
    {"id": "n1", "label": "entity name", "type": "entity type", "title": "short title", "description": "brief description"}
  ],
  "edges": [
    {"label": "relation name", "source": "n1", "target": "n2"}
  ]
}

Rules:
1. Only extract explicitly mentioned entities
2. Every node needs a unique id and a label
3. Edge source and target must reference node ids from this response
4. Keep descriptions brief (under 50 words)
5. If no entities are found, return empty arrays

Return ONLY valid JSON, no other text."#;

const DEFAULT_CLASSIFICATION_SYSTEM: &str = r#"You are an intent classification system for a document question-answering agent.

VALID INTENTS: {intents}

Classify the user's latest message into exactly one intent:
- "fetch-then-retrieve": a new question that needs fresh document retrieval
- "reuse-last-context": a follow-up that can be answered from the previous context
- "answer-directly": chitchat or a question needing no document context

Respond ONLY with a JSON object, no other text:
{"intent": "<intent>"}"#;

const DEFAULT_ANSWER_SYSTEM: &str = r#"You are a helpful research assistant. Answer the question using the provided context when it is relevant. If the context does not contain the answer, say so rather than inventing one. Keep answers concise."#;
