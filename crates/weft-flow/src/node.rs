//! The flow node trait.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use weft_core::{WeftError, WeftResult};

use crate::action::Action;
use crate::context::FlowContext;

/// Retry policy for a node's execute phase.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of execute attempts (minimum 1).
    pub max_attempts: u32,
    /// Wait between attempts.
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            wait: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy.
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }
}

/// A unit of work in a flow.
///
/// The engine invokes the three phases in strict sequence per visit:
/// `prepare` reads the context into an input, `execute` performs the work
/// (and may be retried, so it gets no context access), and `finalize`
/// writes results back and picks the next transition.
///
/// Implementations must hold configuration only. Nodes are shared across
/// concurrent runs of the same compiled flow; per-run mutable state belongs
/// in the [`FlowContext`].
#[async_trait]
pub trait FlowNode: Send + Sync {
    /// Unique node name within a flow.
    fn name(&self) -> &str;

    /// Read the context and produce the execute input.
    async fn prepare(&self, ctx: &FlowContext) -> WeftResult<Value>;

    /// Perform the node's work. May be invoked multiple times with the same
    /// input under the node's retry policy; must be side-effect safe to
    /// repeat.
    async fn execute(&self, input: &Value) -> WeftResult<Value>;

    /// Write results back to the context and select the next transition.
    async fn finalize(
        &self,
        ctx: &mut FlowContext,
        input: Value,
        result: Value,
    ) -> WeftResult<Action>;

    /// Retry policy for the execute phase. Default: a single attempt.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    /// Fallback result when all execute attempts fail. Returning `Some`
    /// substitutes the value and lets the run continue; `None` (default)
    /// propagates the failure to the flow caller.
    fn fallback(&self, _input: &Value, _error: &WeftError) -> Option<Value> {
        None
    }
}
