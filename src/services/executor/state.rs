//! Execution State
//!
//! Run-scoped record threaded through the pipeline. One instance is created
//! per `PlanExecutor::execute` call and owned by that call; the collector and
//! step runner never hold it across a suspension point, so no locking is
//! needed even when tool calls run concurrently.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::models::execution::{ExecutionStepResult, StepStatus};

/// Metadata keys written by the pipeline driver.
pub mod keys {
    pub const EXECUTION_ID: &str = "executionId";
    pub const STARTED_AT: &str = "startedAt";
    pub const COMPLETED_AT: &str = "completedAt";
    pub const EXECUTION_TIME_MS: &str = "executionTimeMs";
    pub const APPROACH: &str = "approach";
    pub const PRIORITY: &str = "priority";
    pub const TIMEOUT_MS: &str = "timeoutMs";
    pub const RETRY_ATTEMPTS: &str = "retryAttempts";
    pub const CANCELLED: &str = "cancelled";
}

/// Mutable state of one plan execution.
///
/// Invariant: every executed step id is in exactly one of
/// `completed_steps`, `partial_steps`, `failed_steps`; skipped ids are in
/// none of them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub current_step_index: usize,
    pub completed_steps: Vec<String>,
    pub partial_steps: Vec<String>,
    pub failed_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
    pub collected_data: BTreeMap<String, Value>,
    pub derived_insights: Vec<String>,
    pub metadata: BTreeMap<String, Value>,
}

impl ExecutionState {
    /// Fresh state for a new run.
    pub fn new(execution_id: impl Into<String>) -> Self {
        let mut state = Self::default();
        state.set_metadata(keys::EXECUTION_ID, Value::String(execution_id.into()));
        state
    }

    pub fn set_metadata(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn execution_id(&self) -> &str {
        self.metadata_str(keys::EXECUTION_ID).unwrap_or_default()
    }

    /// Store collected data for a source, replacing any earlier value.
    pub fn record_collection(&mut self, source: &str, data: Value) {
        self.collected_data.insert(source.to_string(), data);
    }

    /// Apply the bookkeeping for a finished step.
    ///
    /// Only completed steps contribute to the run-wide insight list.
    pub fn record_step(&mut self, result: &ExecutionStepResult) {
        match result.status {
            StepStatus::Completed => {
                self.completed_steps.push(result.step_id.clone());
                self.derived_insights.extend(result.insights().iter().cloned());
            }
            StepStatus::Partial => self.partial_steps.push(result.step_id.clone()),
            StepStatus::Failed => self.failed_steps.push(result.step_id.clone()),
            StepStatus::Skipped => self.skipped_steps.push(result.step_id.clone()),
        }
        self.current_step_index += 1;
    }

    /// Mark a step as left out by the caller.
    pub fn record_skip(&mut self, step_id: &str) {
        self.skipped_steps.push(step_id.to_string());
        self.current_step_index += 1;
    }

    /// Steps that actually ran.
    pub fn attempted_steps(&self) -> usize {
        self.completed_steps.len() + self.partial_steps.len() + self.failed_steps.len()
    }

    /// Steps counted as completed for scoring.
    pub fn completed_for_scoring(&self, count_partial: bool) -> usize {
        if count_partial {
            self.completed_steps.len() + self.partial_steps.len()
        } else {
            self.completed_steps.len()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.metadata
            .get(keys::CANCELLED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Check that no step id is tracked in more than one outcome list.
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.completed_steps
            .iter()
            .chain(&self.partial_steps)
            .chain(&self.failed_steps)
            .chain(&self.skipped_steps)
            .all(|id| seen.insert(id.as_str()))
    }
}
