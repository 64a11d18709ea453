//! Step Runner
//!
//! Executes one analysis step: invokes every tool call of the step against
//! the data collected so far, classifies the outcome, and extracts insights.
//!
//! A failing tool call never aborts its step; the remaining calls still run
//! and the failure is recorded on the `ToolCallResult`. Skip filtering is the
//! caller's job: a skipped step is never handed to the runner.

use std::collections::BTreeMap;

use analyst_core::ToolContext;
use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::execution::{ExecutionStepResult, StepStatus, ToolCallResult};
use crate::models::plan::{AnalysisStep, StepType, ToolCall};
use crate::services::executor::invoker::ToolInvoker;
use crate::services::executor::scoring::classify_step;

/// Insight count above which a deeper follow-up is suggested.
const DEEP_ANALYSIS_INSIGHTS: usize = 3;

/// Runs analysis steps through a `ToolInvoker`.
pub struct StepRunner<'a> {
    invoker: &'a ToolInvoker,
    concurrent: bool,
}

impl<'a> StepRunner<'a> {
    pub fn new(invoker: &'a ToolInvoker) -> Self {
        Self {
            invoker,
            concurrent: false,
        }
    }

    /// Run the tool calls of a step concurrently; results keep declaration order.
    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Execute `step` and return its result.
    pub async fn execute_step(
        &self,
        step: &AnalysisStep,
        collected_data: &BTreeMap<String, Value>,
        execution_id: &str,
        priority: Option<&str>,
    ) -> ExecutionStepResult {
        debug!(
            "[StepRunner] Step '{}' ({} tool calls)",
            step.step_id,
            step.tool_calls.len()
        );

        let available_data = Value::Object(
            collected_data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let calls = step.tool_calls.iter().enumerate().map(|(index, call)| {
            let ctx = ToolContext::new(execution_id, format!("{}#{}", step.step_id, index))
                .with_step(&step.step_id)
                .with_priority(priority.map(str::to_string));
            self.run_tool_call(call, ctx, &available_data)
        });

        let tool_results: Vec<ToolCallResult> = if self.concurrent {
            join_all(calls).await
        } else {
            let mut results = Vec::with_capacity(step.tool_calls.len());
            for call in calls {
                results.push(call.await);
            }
            results
        };

        let derived_insights: Vec<String> = tool_results
            .iter()
            .flat_map(|r| r.output_strings("insights"))
            .collect();

        let successes = tool_results.iter().filter(|r| r.is_success()).count();
        let (status, ratio) = classify_step(successes, tool_results.len());
        let recommendations = next_step_recommendations(step.step_type, &tool_results, &derived_insights);

        info!(
            "[StepRunner] Step '{}' {} ({}/{} tool calls succeeded)",
            step.step_id,
            status,
            successes,
            tool_results.len()
        );

        ExecutionStepResult {
            step_id: step.step_id.clone(),
            status,
            tool_results,
            derived_insights: (!derived_insights.is_empty()).then_some(derived_insights),
            data_quality_score: ratio,
            confidence_in_results: ratio,
            next_step_recommendations: (!recommendations.is_empty()).then_some(recommendations),
        }
    }

    async fn run_tool_call(
        &self,
        call: &ToolCall,
        ctx: ToolContext,
        available_data: &Value,
    ) -> ToolCallResult {
        let mut input: serde_json::Map<String, Value> = call
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        input.insert("availableData".to_string(), available_data.clone());

        let outcome = self
            .invoker
            .invoke(&call.tool_id, ctx, Value::Object(input))
            .await;

        let (output, error) = match outcome.result {
            Ok(output) => (Some(output), None),
            Err(err) => (None, Some(err.to_string())),
        };

        ToolCallResult {
            tool_id: call.tool_id.clone(),
            input: call.parameters.clone(),
            output,
            error,
            execution_time_ms: outcome.elapsed_ms,
            attempts: outcome.attempts,
        }
    }
}

/// Heuristic follow-ups for a finished step.
pub fn next_step_recommendations(
    step_type: StepType,
    tool_results: &[ToolCallResult],
    derived_insights: &[String],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let mut failed: Vec<&str> = Vec::new();
    for result in tool_results.iter().filter(|r| !r.is_success()) {
        if !failed.contains(&result.tool_id.as_str()) {
            failed.push(&result.tool_id);
        }
    }
    if !failed.is_empty() {
        recommendations.push(format!("Retry failed tools: {}", failed.join(", ")));
    }

    if derived_insights.len() > DEEP_ANALYSIS_INSIGHTS {
        recommendations.push(format!(
            "Consider deeper analysis of the {} derived insights",
            derived_insights.len()
        ));
    }

    match step_type {
        StepType::DataCollection => {
            recommendations.push("Proceed with data validation and cleaning".to_string())
        }
        StepType::Analysis => {
            recommendations.push("Generate visualizations for key patterns".to_string())
        }
        _ => {}
    }

    recommendations
}

/// Whether a step outcome counts as progress for bookkeeping.
pub fn is_progress(status: StepStatus, count_partial: bool) -> bool {
    match status {
        StepStatus::Completed => true,
        StepStatus::Partial => count_partial,
        StepStatus::Failed | StepStatus::Skipped => false,
    }
}
