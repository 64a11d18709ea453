//! Data Collector
//!
//! Resolves each data requirement of a plan to a tool, invokes it once
//! (through the retrying `ToolInvoker`), scores the result, and stores the
//! collected data in the execution state under the requirement's source.
//!
//! A requirement that cannot be resolved or whose tool fails yields a
//! zero-quality `DataCollectionResult`; it never aborts the run.

use analyst_core::{ResolutionStrategy, ToolContext};
use futures_util::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::execution::DataCollectionResult;
use crate::models::plan::DataRequirement;
use crate::services::executor::invoker::ToolInvoker;
use crate::services::executor::scoring::{collection_quality_score, LOW_QUALITY_THRESHOLD};
use crate::services::executor::state::{keys, ExecutionState};

/// Resolves and invokes data requirements.
pub struct DataCollector<'a> {
    invoker: &'a ToolInvoker,
    concurrent: bool,
}

impl<'a> DataCollector<'a> {
    pub fn new(invoker: &'a ToolInvoker) -> Self {
        Self {
            invoker,
            concurrent: false,
        }
    }

    /// Invoke independent requirements concurrently; results are still
    /// committed in plan order.
    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Collect every requirement, in plan order, into `state.collected_data`.
    pub async fn collect(
        &self,
        requirements: &[DataRequirement],
        state: &mut ExecutionState,
    ) -> Vec<DataCollectionResult> {
        let execution_id = state.execution_id().to_string();
        let priority = state.metadata_str(keys::PRIORITY).map(str::to_string);

        let outcomes = if self.concurrent {
            join_all(
                requirements
                    .iter()
                    .map(|r| self.collect_one(r, &execution_id, priority.clone())),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(requirements.len());
            for requirement in requirements {
                outcomes.push(
                    self.collect_one(requirement, &execution_id, priority.clone())
                        .await,
                );
            }
            outcomes
        };

        let mut results = Vec::with_capacity(outcomes.len());
        for (requirement, (result, collected)) in requirements.iter().zip(outcomes) {
            if let Some(data) = collected {
                state.record_collection(&requirement.source, data);
            }
            results.push(result);
        }

        info!(
            "[DataCollector] Collected {}/{} data sources ({} with errors)",
            results.iter().filter(|r| r.quality_score > 0.0).count(),
            results.len(),
            results.iter().filter(|r| r.has_errors()).count()
        );
        results
    }

    /// Resolve, invoke, and score one requirement.
    ///
    /// Returns the result record plus the raw data to store, if any.
    async fn collect_one(
        &self,
        requirement: &DataRequirement,
        execution_id: &str,
        priority: Option<String>,
    ) -> (DataCollectionResult, Option<Value>) {
        let Some(resolution) = self
            .invoker
            .registry()
            .resolve(requirement.kind, &requirement.source)
        else {
            warn!(
                "[DataCollector] No tool for '{}' ({})",
                requirement.source, requirement.kind
            );
            let result = DataCollectionResult::failed(
                &requirement.source,
                None,
                format!(
                    "No suitable tool found for requirement type: {}",
                    requirement.kind
                ),
                0,
            );
            return (result, None);
        };

        if resolution.strategy == ResolutionStrategy::SubstringFallback {
            debug!(
                "[DataCollector] '{}' resolved to '{}' by name match",
                requirement.source, resolution.tool_id
            );
        }

        let ctx = ToolContext::new(execution_id, format!("collect:{}", requirement.source))
            .with_priority(priority);
        let input = Value::Object(requirement.parameters.clone().into_iter().collect());
        let outcome = self.invoker.invoke(&resolution.tool_id, ctx, input).await;

        let output = match outcome.result {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    "[DataCollector] '{}' via '{}' failed: {}",
                    requirement.source, resolution.tool_id, err
                );
                let result = DataCollectionResult::failed(
                    &requirement.source,
                    Some(resolution.tool_id),
                    err.to_string(),
                    outcome.elapsed_ms,
                );
                return (result, None);
            }
        };

        let data_collected = as_data_map(&output);
        let quality_score = collection_quality_score(&data_collected, &output);

        let mut errors = Vec::new();
        if quality_score < LOW_QUALITY_THRESHOLD {
            errors.push(format!(
                "Low data quality score ({:.2}) for source '{}'",
                quality_score, requirement.source
            ));
        }

        let result = DataCollectionResult {
            data_source: requirement.source.clone(),
            tool_id: Some(resolution.tool_id),
            data_collected,
            quality_score,
            collection_time_ms: outcome.elapsed_ms,
            errors: (!errors.is_empty()).then_some(errors),
        };
        (result, Some(output))
    }
}

/// View a tool output as a field map. Non-object outputs are wrapped under
/// `"value"`; `null` becomes an empty map.
fn as_data_map(output: &Value) -> Map<String, Value> {
    match output {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other.clone());
            map
        }
    }
}
