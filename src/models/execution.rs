//! Execution Result Models
//!
//! Output side of the executor. Every type here is created once during a run
//! and never mutated after it has been handed to the next stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::plan::Approach;

/// Outcome of a single analysis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Every tool call succeeded
    Completed,
    /// Some, but not all, tool calls succeeded
    Partial,
    /// No tool call succeeded (or the step had none)
    Failed,
    /// Left out by the caller; never attached to a result
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Partial => write!(f, "partial"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of resolving and invoking one data requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCollectionResult {
    pub data_source: String,
    /// Tool chosen for the requirement, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    pub data_collected: Map<String, Value>,
    pub quality_score: f64,
    pub collection_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl DataCollectionResult {
    /// A requirement that produced nothing.
    pub fn failed(
        data_source: impl Into<String>,
        tool_id: Option<String>,
        error: impl Into<String>,
        collection_time_ms: u64,
    ) -> Self {
        Self {
            data_source: data_source.into(),
            tool_id,
            data_collected: Map::new(),
            quality_score: 0.0,
            collection_time_ms,
            errors: Some(vec![error.into()]),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// Result of one tool call within a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub tool_id: String,
    /// Parameters declared by the plan (collected data is not echoed back)
    pub input: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    /// Attempts made, including retries
    pub attempts: u32,
}

impl ToolCallResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// String array field of a successful output (e.g. "insights").
    pub fn output_strings(&self, field: &str) -> Vec<String> {
        if !self.is_success() {
            return Vec::new();
        }
        self.output
            .as_ref()
            .and_then(|o| o.get(field))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Result of one executed analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStepResult {
    pub step_id: String,
    pub status: StepStatus,
    pub tool_results: Vec<ToolCallResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_insights: Option<Vec<String>>,
    pub data_quality_score: f64,
    pub confidence_in_results: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step_recommendations: Option<Vec<String>>,
}

impl ExecutionStepResult {
    pub fn insights(&self) -> &[String] {
        self.derived_insights.as_deref().unwrap_or(&[])
    }

    pub fn successful_calls(&self) -> usize {
        self.tool_results.iter().filter(|r| r.is_success()).count()
    }
}

/// The synthesized analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalAnalysis {
    pub key_findings: Vec<String>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence_score: f64,
    pub data_quality_assessment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitations: Option<Vec<String>>,
}

/// Run counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total_steps: usize,
    pub executed_steps: usize,
    pub skipped_steps: usize,
    pub completed_steps: usize,
    pub partial_steps: usize,
    pub failed_steps: usize,
    pub total_tool_calls: usize,
    pub successful_tool_calls: usize,
    pub data_sources_requested: usize,
    pub data_sources_collected: usize,
    pub total_insights: usize,
    pub execution_time_ms: u64,
    pub cancelled: bool,
}

/// A titled block of the generated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSection {
    pub heading: String,
    pub items: Vec<String>,
}

/// Structured report mirroring the executive summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub title: String,
    pub sections: Vec<ReportSection>,
}

/// Collected data from one source, as handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    pub source: String,
    pub quality_score: f64,
    pub fields: Vec<String>,
}

/// A chart/visualization spec emitted by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationArtifact {
    pub step_id: String,
    pub tool_id: String,
    pub spec: Value,
}

/// Artifacts bundled with the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverables {
    pub report: AnalysisReport,
    pub data_exports: Vec<DataExport>,
    pub visualizations: Vec<VisualizationArtifact>,
}

/// Descriptive metadata about the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    pub approach: Approach,
    pub data_sources: Vec<String>,
    pub tool_effectiveness: BTreeMap<String, f64>,
    pub execution_quality_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Top-level result of executing a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorOutput {
    pub summary: ExecutionSummary,
    pub step_results: Vec<ExecutionStepResult>,
    pub collection_results: Vec<DataCollectionResult>,
    pub final_analysis: FinalAnalysis,
    pub deliverables: Deliverables,
    pub executive_summary: String,
    pub next_actions: Vec<String>,
    pub metadata: ExecutorMetadata,
}
