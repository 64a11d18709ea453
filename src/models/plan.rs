//! Analysis Plan Models
//!
//! Input side of the executor: the plan produced upstream by the planner and
//! the per-run adjustments supplied by the caller.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use analyst_core::DataSourceKind;

use crate::utils::error::{AppError, AppResult};

/// Analytical approach the plan follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    /// What happened
    #[default]
    Descriptive,
    /// Why it happened
    Diagnostic,
    /// What will happen
    Predictive,
    /// What should be done
    Prescriptive,
    /// Open-ended pattern discovery
    Exploratory,
    /// Any approach label a planner emits beyond the ones above
    #[serde(other)]
    Other,
}

impl Approach {
    /// Title-case label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Approach::Descriptive => "Descriptive",
            Approach::Diagnostic => "Diagnostic",
            Approach::Predictive => "Predictive",
            Approach::Prescriptive => "Prescriptive",
            Approach::Exploratory => "Exploratory",
            Approach::Other => "General",
        }
    }
}

impl std::fmt::Display for Approach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Approach::Descriptive => write!(f, "descriptive"),
            Approach::Diagnostic => write!(f, "diagnostic"),
            Approach::Predictive => write!(f, "predictive"),
            Approach::Prescriptive => write!(f, "prescriptive"),
            Approach::Exploratory => write!(f, "exploratory"),
            Approach::Other => write!(f, "other"),
        }
    }
}

/// One external data need of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirement {
    /// Logical name of the source; also the key under which data is collected
    pub source: String,
    /// Kind of source, used to pick a tool
    #[serde(rename = "type")]
    pub kind: DataSourceKind,
    /// Tool input
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl DataRequirement {
    pub fn new(source: impl Into<String>, kind: DataSourceKind) -> Self {
        Self {
            source: source.into(),
            kind,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// Kind of analysis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    DataCollection,
    Analysis,
    Validation,
    Visualization,
    Synthesis,
    /// Any step type this executor has no special handling for
    #[serde(other)]
    Other,
}

/// A single tool invocation declared by a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_id: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl ToolCall {
    pub fn new(tool_id: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// A named group of tool calls that succeed or fail together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStep {
    pub step_id: String,
    pub step_type: StepType,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl AnalysisStep {
    pub fn new(step_id: impl Into<String>, step_type: StepType) -> Self {
        Self {
            step_id: step_id.into(),
            step_type,
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }
}

/// Structured analysis plan, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPlan {
    #[serde(default)]
    pub data_requirements: Vec<DataRequirement>,
    #[serde(default)]
    pub analysis_steps: Vec<AnalysisStep>,
    #[serde(default)]
    pub approach: Approach,
}

impl AnalysisPlan {
    pub fn new(approach: Approach) -> Self {
        Self {
            approach,
            ..Default::default()
        }
    }

    pub fn with_requirement(mut self, requirement: DataRequirement) -> Self {
        self.data_requirements.push(requirement);
        self
    }

    pub fn with_step(mut self, step: AnalysisStep) -> Self {
        self.analysis_steps.push(step);
        self
    }

    /// Reject plans the executor cannot run meaningfully.
    ///
    /// This is the only failure surfaced as `Err` by the executor; everything
    /// that goes wrong while running a valid plan is reported as data.
    pub fn validate(&self) -> AppResult<()> {
        for (index, requirement) in self.data_requirements.iter().enumerate() {
            if requirement.source.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Data requirement #{} has an empty source",
                    index
                )));
            }
        }

        let mut seen = HashSet::new();
        for step in &self.analysis_steps {
            if step.step_id.trim().is_empty() {
                return Err(AppError::validation("Analysis step id cannot be empty"));
            }
            if !seen.insert(step.step_id.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate analysis step id: '{}'",
                    step.step_id
                )));
            }
            if let Some(pos) = step.tool_calls.iter().position(|c| c.tool_id.trim().is_empty()) {
                return Err(AppError::validation(format!(
                    "Tool call #{} in step '{}' has an empty tool id",
                    pos, step.step_id
                )));
            }
        }
        Ok(())
    }

    /// Distinct data source names in plan order.
    pub fn data_sources(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.data_requirements
            .iter()
            .filter(|r| seen.insert(r.source.as_str()))
            .map(|r| r.source.clone())
            .collect()
    }
}

/// Caller adjustments applied to a single run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeAdjustments {
    /// Steps to leave out entirely
    #[serde(default)]
    pub skip_steps: Vec<String>,
    /// Free-form priority hint forwarded to tools
    #[serde(default)]
    pub priority_override: Option<String>,
}

impl RuntimeAdjustments {
    pub fn skipping(steps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            skip_steps: steps.into_iter().map(Into::into).collect(),
            priority_override: None,
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority_override = Some(priority.into());
        self
    }

    pub fn should_skip(&self, step_id: &str) -> bool {
        self.skip_steps.iter().any(|s| s == step_id)
    }
}
