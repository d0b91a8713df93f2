//! Query intent classification types.

use std::fmt;

use serde::Deserialize;
use tracing::warn;

/// The intent of a user's message, used as the branching action after
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// A new question needing fresh document retrieval.
    NewQuestion,
    /// A follow-up answerable from the previous turn's context.
    FollowUp,
    /// Chitchat or a question needing no document context.
    Direct,
}

impl Intent {
    /// All intents, in classification-prompt order.
    pub fn all() -> &'static [Intent] {
        &[Self::NewQuestion, Self::FollowUp, Self::Direct]
    }

    /// All intent labels, for prompt rendering.
    pub fn all_labels() -> Vec<&'static str> {
        Self::all().iter().map(|i| i.as_str()).collect()
    }

    /// The action label for this intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewQuestion => "fetch-then-retrieve",
            Self::FollowUp => "reuse-last-context",
            Self::Direct => "answer-directly",
        }
    }

    /// Parse an intent label with flexible matching.
    pub fn from_str_flexible(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "fetch-then-retrieve" | "retrieve" | "new-question" | "search" => {
                Some(Self::NewQuestion)
            }
            "reuse-last-context" | "follow-up" | "followup" | "reuse" => Some(Self::FollowUp),
            "answer-directly" | "direct" | "chitchat" | "none" => Some(Self::Direct),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    intent: String,
}

/// Parse the classifier's response, falling back to [`Intent::Direct`] when
/// the output is unusable. Answering without document context is the safe
/// degraded behavior.
pub(crate) fn parse_intent(response: &str) -> Intent {
    let candidate = slice_json_object(response);
    if let Ok(parsed) = serde_json::from_str::<IntentResponse>(candidate) {
        if let Some(intent) = Intent::from_str_flexible(&parsed.intent) {
            return intent;
        }
    }
    // Lenient fallback: the bare label somewhere in the response.
    for intent in Intent::all() {
        if response.to_lowercase().contains(intent.as_str()) {
            return *intent;
        }
    }
    warn!("unparseable intent response, answering directly");
    Intent::Direct
}

fn slice_json_object(text: &str) -> &str {
    let text = text.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
