//! Context Hierarchy
//!
//! Defines the context a tool sees while it runs:
//!
//! 1. `ExecutionContext` trait - Base immutable context shared by every call in a run
//! 2. `ToolContext` - Concrete struct for a single tool invocation
//!
//! Tools only ever receive a `ToolContext` by shared reference, so they cannot
//! mutate run state or influence which step runs next.

// ============================================================================
// ExecutionContext Trait
// ============================================================================

/// Base execution context trait providing immutable run information.
pub trait ExecutionContext: Send + Sync {
    /// Returns the unique identifier of the plan execution.
    fn execution_id(&self) -> &str;

    /// Returns the caller-supplied priority override, if any
    /// (e.g., "speed", "thoroughness").
    fn priority(&self) -> Option<&str> {
        None
    }
}

// ============================================================================
// ToolContext
// ============================================================================

/// Context for one tool invocation.
///
/// Carries the identity of the call (`tool_call_id`), the step it belongs to
/// (none during data collection), and the 1-based attempt number so that
/// tools can tell a retry from a first attempt.
#[derive(Debug, Clone)]
pub struct ToolContext {
    execution_id: String,
    tool_call_id: String,
    step_id: Option<String>,
    priority: Option<String>,
    attempt: u32,
}

impl ToolContext {
    /// Create a new ToolContext for the first attempt of a call.
    pub fn new(execution_id: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            tool_call_id: tool_call_id.into(),
            step_id: None,
            priority: None,
            attempt: 1,
        }
    }

    /// Set the owning analysis step.
    pub fn with_step(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    /// Set the priority override.
    pub fn with_priority(mut self, priority: Option<String>) -> Self {
        self.priority = priority;
        self
    }

    /// Set the attempt number (1-based).
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt.max(1);
        self
    }

    /// Returns the unique tool call identifier.
    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    /// Returns the owning step id, or `None` during data collection.
    pub fn step_id(&self) -> Option<&str> {
        self.step_id.as_deref()
    }

    /// Returns the 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether this invocation is a retry of an earlier failed attempt.
    pub fn is_retry(&self) -> bool {
        self.attempt > 1
    }
}

impl ExecutionContext for ToolContext {
    fn execution_id(&self) -> &str {
        &self.execution_id
    }

    fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }
}
