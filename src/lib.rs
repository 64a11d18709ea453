//! Analyst Executor
//!
//! Executes structured business-intelligence analysis plans against a
//! registry of pluggable tools and synthesizes a quality-scored result.
//! It includes:
//! - Plan, result, and settings models
//! - The execution pipeline (collection, steps, synthesis)
//! - Error types shared by the pipeline
//!
//! Tools, the planner that produces plans, and any transport in front of
//! the executor are supplied by the host.

pub mod models;
pub mod services;
pub mod utils;

pub use analyst_core::{
    AnalysisTool, CoreError, CoreResult, DataSourceKind, ExecutionContext, ToolCapability,
    ToolContext, ToolDefinition, ToolExecutable, ToolRegistry,
};
pub use models::execution::{ExecutionStepResult, ExecutorOutput, FinalAnalysis, StepStatus};
pub use models::plan::{AnalysisPlan, AnalysisStep, Approach, DataRequirement, RuntimeAdjustments};
pub use models::settings::{ExecutorConfig, ExecutorConfigUpdate};
pub use services::executor::PlanExecutor;
pub use utils::error::{AppError, AppResult};
