//! Synthesizer
//!
//! Folds the final execution state, the step results and the collection
//! results into an `ExecutorOutput`. Pure: the same inputs always produce the
//! same output. Timestamps and run timing are read from the state metadata,
//! where the driver put them; nothing here reads the clock.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::execution::{
    DataCollectionResult, DataExport, Deliverables, ExecutionStepResult, ExecutionSummary,
    ExecutorMetadata, ExecutorOutput, FinalAnalysis, VisualizationArtifact,
};
use crate::models::plan::AnalysisPlan;
use crate::services::executor::report::{build_report, executive_summary, next_actions};
use crate::services::executor::scoring::{
    average_data_quality, confidence_score, data_quality_assessment, execution_quality_score,
    tool_effectiveness, QualityInputs, LOW_QUALITY_THRESHOLD,
};
use crate::services::executor::state::{keys, ExecutionState};
use crate::services::executor::step_runner::is_progress;

/// Number of key findings and recommendations surfaced.
pub const MAX_HIGHLIGHTS: usize = 5;

/// Builds the final output of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer {
    count_partial_as_completed: bool,
}

impl Synthesizer {
    pub fn new(count_partial_as_completed: bool) -> Self {
        Self {
            count_partial_as_completed,
        }
    }

    pub fn synthesize(
        &self,
        state: &ExecutionState,
        step_results: &[ExecutionStepResult],
        collection_results: &[DataCollectionResult],
        plan: &AnalysisPlan,
    ) -> ExecutorOutput {
        let final_analysis = self.final_analysis(state, step_results, collection_results);
        let summary = self.summary(state, step_results, collection_results, plan);

        let quality = execution_quality_score(&QualityInputs {
            steps_completed: state.completed_for_scoring(self.count_partial_as_completed),
            steps_attempted: state.attempted_steps(),
            avg_data_quality: average_data_quality(collection_results),
            successful_tool_calls: summary.successful_tool_calls,
            total_tool_calls: summary.total_tool_calls,
            insight_count: summary.total_insights,
        });

        let metadata = ExecutorMetadata {
            execution_id: state.metadata_str(keys::EXECUTION_ID).map(str::to_string),
            approach: plan.approach,
            data_sources: plan.data_sources(),
            tool_effectiveness: tool_effectiveness(step_results),
            execution_quality_score: quality,
            priority: state.metadata_str(keys::PRIORITY).map(str::to_string),
            started_at: state.metadata_str(keys::STARTED_AT).map(str::to_string),
            completed_at: state.metadata_str(keys::COMPLETED_AT).map(str::to_string),
        };

        let deliverables = Deliverables {
            report: build_report(plan.approach, &final_analysis),
            data_exports: data_exports(collection_results),
            visualizations: visualizations(step_results),
        };

        ExecutorOutput {
            executive_summary: executive_summary(plan.approach, &final_analysis),
            next_actions: next_actions(plan.approach, final_analysis.confidence_score),
            summary,
            step_results: step_results.to_vec(),
            collection_results: collection_results.to_vec(),
            final_analysis,
            deliverables,
            metadata,
        }
    }

    fn final_analysis(
        &self,
        state: &ExecutionState,
        step_results: &[ExecutionStepResult],
        collection_results: &[DataCollectionResult],
    ) -> FinalAnalysis {
        let key_findings: Vec<String> = step_results
            .iter()
            .filter(|s| is_progress(s.status, self.count_partial_as_completed))
            .flat_map(|s| s.insights().iter().cloned())
            .take(MAX_HIGHLIGHTS)
            .collect();

        let insights = dedup(step_results.iter().flat_map(|s| s.insights().iter().cloned()));

        let tool_recommendations = step_results
            .iter()
            .flat_map(|s| &s.tool_results)
            .flat_map(|r| r.output_strings("recommendations"));
        let step_recommendations = step_results
            .iter()
            .flat_map(|s| s.next_step_recommendations.iter().flatten().cloned());
        let mut recommendations = dedup(tool_recommendations.chain(step_recommendations));
        recommendations.truncate(MAX_HIGHLIGHTS);

        let avg_data_quality = average_data_quality(collection_results);
        let confidence = confidence_score(
            state.completed_for_scoring(self.count_partial_as_completed),
            state.attempted_steps(),
            avg_data_quality,
        );

        let mut limitations = Vec::new();
        if !state.failed_steps.is_empty() {
            limitations.push(format!("{} steps failed", state.failed_steps.len()));
        }
        let low_quality = collection_results
            .iter()
            .filter(|r| r.quality_score < LOW_QUALITY_THRESHOLD)
            .count();
        if low_quality > 0 {
            limitations.push(format!("{} data sources had quality issues", low_quality));
        }

        FinalAnalysis {
            key_findings,
            insights,
            recommendations,
            confidence_score: confidence,
            data_quality_assessment: data_quality_assessment(avg_data_quality),
            limitations: (!limitations.is_empty()).then_some(limitations),
        }
    }

    fn summary(
        &self,
        state: &ExecutionState,
        step_results: &[ExecutionStepResult],
        collection_results: &[DataCollectionResult],
        plan: &AnalysisPlan,
    ) -> ExecutionSummary {
        ExecutionSummary {
            total_steps: plan.analysis_steps.len(),
            executed_steps: state.attempted_steps(),
            skipped_steps: state.skipped_steps.len(),
            completed_steps: state.completed_steps.len(),
            partial_steps: state.partial_steps.len(),
            failed_steps: state.failed_steps.len(),
            total_tool_calls: step_results.iter().map(|s| s.tool_results.len()).sum(),
            successful_tool_calls: step_results.iter().map(|s| s.successful_calls()).sum(),
            data_sources_requested: plan.data_requirements.len(),
            data_sources_collected: collection_results
                .iter()
                .filter(|r| r.quality_score > 0.0)
                .count(),
            total_insights: step_results.iter().map(|s| s.insights().len()).sum(),
            execution_time_ms: state
                .metadata
                .get(keys::EXECUTION_TIME_MS)
                .and_then(Value::as_u64)
                .unwrap_or(0),
            cancelled: state.is_cancelled(),
        }
    }
}

fn data_exports(collection_results: &[DataCollectionResult]) -> Vec<DataExport> {
    collection_results
        .iter()
        .filter(|r| r.quality_score > 0.0)
        .map(|r| DataExport {
            source: r.data_source.clone(),
            quality_score: r.quality_score,
            fields: r.data_collected.keys().cloned().collect(),
        })
        .collect()
}

fn visualizations(step_results: &[ExecutionStepResult]) -> Vec<VisualizationArtifact> {
    step_results
        .iter()
        .flat_map(|step| {
            step.tool_results
                .iter()
                .filter(|r| r.is_success())
                .filter_map(move |r| {
                    let spec = r.output.as_ref()?.get("visualization")?;
                    (!spec.is_null()).then(|| VisualizationArtifact {
                        step_id: step.step_id.clone(),
                        tool_id: r.tool_id.clone(),
                        spec: spec.clone(),
                    })
                })
        })
        .collect()
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
