//! Transition actions.

use std::fmt;

/// The action returned by a node's finalize phase, used to select the next
/// node in a flow.
///
/// A tagged union rather than a bare string: `Default` is the sentinel for
/// the common single-successor case, `Label` carries an application-defined
/// tag such as an intent name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// The default/fallback transition.
    Default,
    /// An application-defined transition tag.
    Label(String),
}

impl Action {
    /// Create a labeled action.
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }

    /// Get the string form of the action.
    pub fn as_str(&self) -> &str {
        match self {
            Action::Default => "default",
            Action::Label(label) => label,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Action {
    fn from(label: &str) -> Self {
        Action::Label(label.to_string())
    }
}

impl From<String> for Action {
    fn from(label: String) -> Self {
        Action::Label(label)
    }
}
