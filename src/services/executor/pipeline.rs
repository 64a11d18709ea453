//! Plan Executor
//!
//! Drives one plan from start to finish: fresh state, data collection,
//! sequential step execution, synthesis. Only an invalid plan or an invalid
//! configuration is returned as `Err`; every other failure ends up in the
//! output as data.

use std::sync::Arc;
use std::time::Duration;

use analyst_core::ToolRegistry;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::execution::ExecutorOutput;
use crate::models::plan::{AnalysisPlan, RuntimeAdjustments};
use crate::models::settings::ExecutorConfig;
use crate::services::executor::collector::DataCollector;
use crate::services::executor::invoker::{RetryPolicy, ToolInvoker};
use crate::services::executor::state::{keys, ExecutionState};
use crate::services::executor::step_runner::StepRunner;
use crate::services::executor::synthesizer::Synthesizer;
use crate::utils::error::AppResult;

/// Executes analysis plans against a tool registry.
pub struct PlanExecutor {
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    cancellation_token: CancellationToken,
}

impl PlanExecutor {
    pub fn new(registry: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self {
            registry,
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Get the cancellation token for external cancellation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Cancel every run of this executor.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute `plan` and synthesize its result.
    pub async fn execute(
        &self,
        plan: &AnalysisPlan,
        adjustments: Option<&RuntimeAdjustments>,
    ) -> AppResult<ExecutorOutput> {
        self.config.validate()?;
        plan.validate()?;

        let started = Instant::now();
        let execution_id = Uuid::new_v4().to_string();
        let priority = adjustments.and_then(|a| a.priority_override.clone());

        let mut state = ExecutionState::new(&execution_id);
        state.set_metadata(keys::STARTED_AT, json!(Utc::now().to_rfc3339()));
        state.set_metadata(keys::APPROACH, json!(plan.approach.to_string()));
        state.set_metadata(keys::TIMEOUT_MS, json!(self.config.timeout_ms));
        state.set_metadata(keys::RETRY_ATTEMPTS, json!(self.config.retry_attempts));
        if let Some(priority) = &priority {
            state.set_metadata(keys::PRIORITY, json!(priority));
        }

        info!(
            "[PlanExecutor] Starting execution {} ({} approach, {} requirements, {} steps)",
            execution_id,
            plan.approach,
            plan.data_requirements.len(),
            plan.analysis_steps.len()
        );

        let deadline = self
            .config
            .run_timeout_ms
            .map(|ms| started + Duration::from_millis(ms));
        let invoker = ToolInvoker::new(
            Arc::clone(&self.registry),
            RetryPolicy::from_config(&self.config),
            self.cancellation_token.clone(),
        )
        .with_deadline(deadline);

        let collection_results = DataCollector::new(&invoker)
            .with_concurrency(self.config.concurrent_collection)
            .collect(&plan.data_requirements, &mut state)
            .await;

        if let Some(adjustments) = adjustments {
            for id in &adjustments.skip_steps {
                if !plan.analysis_steps.iter().any(|s| &s.step_id == id) {
                    warn!("[PlanExecutor] Ignoring unknown skip step id '{}'", id);
                }
            }
        }

        let runner =
            StepRunner::new(&invoker).with_concurrency(self.config.concurrent_tool_calls);
        let mut step_results = Vec::with_capacity(plan.analysis_steps.len());

        for step in &plan.analysis_steps {
            if adjustments.is_some_and(|a| a.should_skip(&step.step_id)) {
                info!("[PlanExecutor] Skipping step '{}'", step.step_id);
                state.record_skip(&step.step_id);
                continue;
            }

            if invoker.is_cancelled() {
                warn!(
                    "[PlanExecutor] Execution {} cancelled before step '{}'",
                    execution_id, step.step_id
                );
                break;
            }

            let result = runner
                .execute_step(
                    step,
                    &state.collected_data,
                    &execution_id,
                    priority.as_deref(),
                )
                .await;
            state.record_step(&result);
            step_results.push(result);
        }
        debug_assert!(
            state.is_consistent(),
            "step id recorded under more than one outcome"
        );

        let cancelled = invoker.is_cancelled();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        state.set_metadata(keys::COMPLETED_AT, json!(Utc::now().to_rfc3339()));
        state.set_metadata(keys::EXECUTION_TIME_MS, json!(elapsed_ms));
        state.set_metadata(keys::CANCELLED, Value::Bool(cancelled));

        let output = Synthesizer::new(self.config.count_partial_as_completed).synthesize(
            &state,
            &step_results,
            &collection_results,
            plan,
        );

        info!(
            "[PlanExecutor] Execution {} finished in {}ms: {} completed, {} partial, {} failed, {} skipped (quality {:.2})",
            execution_id,
            elapsed_ms,
            state.completed_steps.len(),
            state.partial_steps.len(),
            state.failed_steps.len(),
            state.skipped_steps.len(),
            output.metadata.execution_quality_score
        );

        Ok(output)
    }
}
