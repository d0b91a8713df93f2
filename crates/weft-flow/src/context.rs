//! Per-run flow context.

use std::collections::HashMap;

use serde_json::Value;

/// Mutable record threaded through one flow run.
///
/// Constructed fresh at the start of a run and discarded at the end; never
/// shared across concurrent runs. All per-run state lives here, not on the
/// nodes.
#[derive(Debug, Default)]
pub struct FlowContext {
    values: HashMap<String, Value>,
    current_node: Option<String>,
    visited: Vec<String>,
}

impl FlowContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under a key, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Remove a value by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// The node currently (or most recently) executing in this run.
    pub fn current_node(&self) -> Option<&str> {
        self.current_node.as_deref()
    }

    /// Names of nodes that have completed, in execution order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Record entry into a node. Called by the engine before the node's
    /// phases run.
    pub(crate) fn enter_node(&mut self, name: &str) {
        self.current_node = Some(name.to_string());
    }

    /// Record completion of a node. Called by the engine after finalize.
    pub(crate) fn exit_node(&mut self, name: &str) {
        self.visited.push(name.to_string());
    }
}
