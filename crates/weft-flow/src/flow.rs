//! Flow graph construction and execution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use backon::{ConstantBuilder, Retryable};
use serde_json::Value;
use tracing::{debug, warn};

use weft_core::{ErrorCode, WeftError, WeftResult};

use crate::action::Action;
use crate::context::FlowContext;
use crate::node::FlowNode;

/// A compiled, reusable workflow graph.
///
/// Built once via [`FlowBuilder`], then shared (e.g. behind an `Arc`) by
/// any number of concurrent runs. Each run owns its own [`FlowContext`].
pub struct Flow {
    start: String,
    nodes: HashMap<String, Arc<dyn FlowNode>>,
    edges: HashMap<(String, Action), String>,
}

// Node trait objects are not Debug, so render their names.
impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        nodes.sort_unstable();
        f.debug_struct("Flow")
            .field("start", &self.start)
            .field("nodes", &nodes)
            .field("edges", &self.edges.len())
            .finish()
    }
}

/// Builder for [`Flow`].
#[derive(Default)]
pub struct FlowBuilder {
    start: Option<String>,
    nodes: HashMap<String, Arc<dyn FlowNode>>,
    edges: HashMap<(String, Action), String>,
}

impl FlowBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its own name.
    pub fn node(mut self, node: Arc<dyn FlowNode>) -> Self {
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    /// Set the entry node.
    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    /// Add the default transition from one node to another.
    pub fn edge(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.on(from, Action::Default, to)
    }

    /// Add an action-keyed transition.
    pub fn on(
        mut self,
        from: impl Into<String>,
        action: Action,
        to: impl Into<String>,
    ) -> Self {
        self.edges.insert((from.into(), action), to.into());
        self
    }

    /// Validate the graph and produce a [`Flow`].
    ///
    /// Every edge endpoint must name a registered node and the entry node
    /// must be set and registered.
    pub fn build(self) -> WeftResult<Flow> {
        let start = self
            .start
            .ok_or_else(|| WeftError::Configuration("flow has no start node".to_string()))?;
        if !self.nodes.contains_key(&start) {
            return Err(WeftError::Configuration(format!(
                "start node '{}' is not registered",
                start
            )));
        }
        for ((from, action), to) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(WeftError::Configuration(format!(
                    "edge ({}, {}) starts at unregistered node",
                    from, action
                )));
            }
            if !self.nodes.contains_key(to) {
                return Err(WeftError::Configuration(format!(
                    "edge ({}, {}) targets unregistered node '{}'",
                    from, action, to
                )));
            }
        }
        Ok(Flow {
            start,
            nodes: self.nodes,
            edges: self.edges,
        })
    }
}

impl Flow {
    /// Execute the flow to completion.
    ///
    /// Starting at the entry node, each node's three phases run in
    /// sequence; the action returned by finalize selects the next node via
    /// the `(node, action)` edge table, falling back to the node's default
    /// edge. When neither matches, the run terminates and the last action
    /// is returned as the run's result.
    pub async fn run(&self, ctx: &mut FlowContext) -> WeftResult<Action> {
        let mut current = self.start.clone();
        loop {
            let node = self.nodes.get(&current).ok_or_else(|| WeftError::Flow {
                node: current.clone(),
                message: "node not registered in flow".to_string(),
                code: ErrorCode::FlowMissingNode,
                source: None,
            })?;

            ctx.enter_node(node.name());
            let input = node.prepare(ctx).await?;
            let result = Self::execute_with_retry(node.as_ref(), &input).await?;
            let action = node.finalize(ctx, input, result).await?;
            ctx.exit_node(node.name());

            let next = self
                .edges
                .get(&(current.clone(), action.clone()))
                .or_else(|| self.edges.get(&(current.clone(), Action::Default)));
            match next {
                Some(target) => {
                    debug!(from = %current, via = %action, to = %target, "flow transition");
                    current = target.clone();
                }
                None => {
                    debug!(node = %current, action = %action, "flow terminated");
                    return Ok(action);
                }
            }
        }
    }

    /// Run the execute phase under the node's retry policy, consulting the
    /// node's fallback once all attempts fail.
    async fn execute_with_retry(node: &dyn FlowNode, input: &Value) -> WeftResult<Value> {
        let policy = node.retry_policy();
        let backoff = ConstantBuilder::default()
            .with_delay(policy.wait)
            .with_max_times(policy.max_attempts.saturating_sub(1) as usize);

        let outcome = (|| async { node.execute(input).await }).retry(backoff).await;
        match outcome {
            Ok(result) => Ok(result),
            Err(error) => match node.fallback(input, &error) {
                Some(value) => {
                    warn!(node = node.name(), %error, "execute failed, using fallback value");
                    Ok(value)
                }
                None => Err(WeftError::Flow {
                    node: node.name().to_string(),
                    message: format!(
                        "execute failed after {} attempt(s)",
                        policy.max_attempts
                    ),
                    code: ErrorCode::FlowRetriesExhausted,
                    source: Some(Box::new(error)),
                }),
            },
        }
    }
}
