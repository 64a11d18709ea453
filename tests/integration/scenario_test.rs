//! Reference Scenario Tests
//!
//! Whole-plan runs covering partial failure, quality comparisons between
//! runs, skipped steps, and plans without data requirements.

use std::sync::Arc;

use analyst_executor::models::execution::StepStatus;
use analyst_executor::models::plan::{StepType, ToolCall};
use analyst_executor::{
    AnalysisPlan, AnalysisStep, Approach, DataRequirement, DataSourceKind, RuntimeAdjustments,
};
use serde_json::json;

use crate::fixtures::{executor, no_retry_config, MockTool};

// ============================================================================
// Scenario A: partial failure in collection and in a step
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_partial_failure_is_reported_as_data() {
    let executor = executor(
        vec![
            Arc::new(MockTool::ok(
                "supabase_query",
                json!({"success": true, "result": "120 rows", "rows": [1, 2, 3]}),
            )),
            Arc::new(MockTool::with_insights("stats", &["Revenue up 12%"])),
            Arc::new(MockTool::failing("broken", "division by zero")),
        ],
        Default::default(),
    );
    let plan = AnalysisPlan::new(Approach::Diagnostic)
        .with_requirement(DataRequirement::new("sales", DataSourceKind::DatabaseQuery))
        .with_requirement(DataRequirement::new("crm", DataSourceKind::ApiCall))
        .with_step(
            AnalysisStep::new("analyze", StepType::Analysis)
                .with_tool_call(ToolCall::new("stats"))
                .with_tool_call(ToolCall::new("broken")),
        );

    let output = executor.execute(&plan, None).await.unwrap();

    let collections = &output.collection_results;
    assert_eq!(collections.len(), 2);
    assert!((collections[0].quality_score - 1.0).abs() < 1e-9);
    assert_eq!(collections[1].quality_score, 0.0);
    assert_eq!(
        collections[1].errors.as_ref().unwrap()[0],
        "No suitable tool found for requirement type: api_call"
    );

    let step = &output.step_results[0];
    assert_eq!(step.status, StepStatus::Partial);
    assert_eq!(step.confidence_in_results, 0.5);
    assert_eq!(step.tool_results[1].attempts, 3);
    assert!(step.tool_results[1]
        .error
        .as_ref()
        .unwrap()
        .contains("division by zero"));

    assert_eq!(output.summary.partial_steps, 1);
    assert_eq!(output.summary.completed_steps, 0);
    assert_eq!(output.summary.data_sources_collected, 1);
    assert_eq!(
        output.final_analysis.limitations,
        Some(vec!["1 data sources had quality issues".to_string()])
    );
    assert!(output.final_analysis.key_findings.is_empty());
    assert_eq!(output.final_analysis.insights, vec!["Revenue up 12%"]);
}

#[tokio::test]
async fn test_collected_data_reaches_steps() {
    let reader = Arc::new(MockTool::new("reader", |_, input| {
        let rows = input["availableData"]["sales"]["rows"].clone();
        Ok(json!({ "insights": [format!("rows={}", rows)] }))
    }));
    let executor = executor(
        vec![Arc::new(MockTool::ok("postgres", json!({"rows": 42}))), reader],
        no_retry_config(),
    );
    let plan = AnalysisPlan::new(Approach::Descriptive)
        .with_requirement(DataRequirement::new("sales", DataSourceKind::DatabaseQuery))
        .with_step(AnalysisStep::new("s1", StepType::Analysis).with_tool_call(ToolCall::new("reader")));

    let output = executor.execute(&plan, None).await.unwrap();
    assert_eq!(output.final_analysis.key_findings, vec!["rows=42"]);
}

// ============================================================================
// Scenario B: failed step lowers the execution quality score
// ============================================================================

fn three_step_plan(third_tool: &str) -> AnalysisPlan {
    AnalysisPlan::new(Approach::Descriptive)
        .with_step(AnalysisStep::new("s1", StepType::Analysis).with_tool_call(ToolCall::new("good")))
        .with_step(AnalysisStep::new("s2", StepType::Analysis).with_tool_call(ToolCall::new("good")))
        .with_step(
            AnalysisStep::new("s3", StepType::Analysis).with_tool_call(ToolCall::new(third_tool)),
        )
}

#[tokio::test]
async fn test_all_steps_succeeding_scores_higher() {
    let tools = || {
        vec![
            Arc::new(MockTool::with_insights("good", &["insight"])),
            Arc::new(MockTool::failing("bad", "boom")),
        ]
    };

    let clean = executor(tools(), no_retry_config())
        .execute(&three_step_plan("good"), None)
        .await
        .unwrap();
    let degraded = executor(tools(), no_retry_config())
        .execute(&three_step_plan("bad"), None)
        .await
        .unwrap();

    assert_eq!(clean.summary.failed_steps, 0);
    assert_eq!(degraded.summary.failed_steps, 1);
    assert!(
        clean.metadata.execution_quality_score > degraded.metadata.execution_quality_score,
        "{} should exceed {}",
        clean.metadata.execution_quality_score,
        degraded.metadata.execution_quality_score
    );
    assert!(clean.final_analysis.confidence_score > degraded.final_analysis.confidence_score);
    assert_eq!(
        degraded.final_analysis.limitations,
        Some(vec!["1 steps failed".to_string()])
    );
}

// ============================================================================
// Scenario C: skipped steps leave no trace in the results
// ============================================================================

#[tokio::test]
async fn test_skipped_step_is_absent_everywhere() {
    let good = Arc::new(MockTool::with_insights("good", &["insight"]));
    let bad = Arc::new(MockTool::failing("bad", "boom"));
    let executor = executor(vec![good.clone(), bad.clone()], no_retry_config());
    let adjustments = RuntimeAdjustments::skipping(["s3"]);

    let output = executor
        .execute(&three_step_plan("bad"), Some(&adjustments))
        .await
        .unwrap();

    assert!(output.step_results.iter().all(|s| s.step_id != "s3"));
    assert_eq!(output.summary.failed_steps, 0);
    assert_eq!(output.summary.completed_steps, 2);
    assert_eq!(output.summary.skipped_steps, 1);
    assert_eq!(output.summary.executed_steps, 2);
    assert_eq!(bad.calls(), 0);
    assert_eq!(good.calls(), 2);
    assert!(output.final_analysis.limitations.is_none());
}

// ============================================================================
// Scenario D: no data requirements
// ============================================================================

#[tokio::test]
async fn test_no_requirements_defaults_to_neutral_quality() {
    let executor = executor(
        vec![Arc::new(MockTool::with_insights("good", &["insight"]))],
        no_retry_config(),
    );
    let plan = AnalysisPlan::new(Approach::Predictive)
        .with_step(AnalysisStep::new("s1", StepType::Analysis).with_tool_call(ToolCall::new("good")));

    let output = executor.execute(&plan, None).await.unwrap();

    assert!(output.collection_results.is_empty());
    assert_eq!(output.final_analysis.confidence_score, 0.75);
    assert!(output
        .final_analysis
        .data_quality_assessment
        .starts_with("Moderate quality"));
    assert!(output
        .next_actions
        .contains(&"Monitor predictions against actual outcomes".to_string()));
    assert!(output
        .executive_summary
        .starts_with("# Predictive Analysis Report"));
}

#[tokio::test]
async fn test_empty_plan_still_produces_output() {
    let executor = executor(vec![], no_retry_config());
    let output = executor
        .execute(&AnalysisPlan::new(Approach::Exploratory), None)
        .await
        .unwrap();

    assert!(output.step_results.is_empty());
    assert_eq!(output.final_analysis.confidence_score, 0.25);
    assert!(output.final_analysis.limitations.is_none());
    assert_eq!(output.next_actions.first().unwrap(), "Review findings with stakeholders");
    assert_eq!(
        output.next_actions.last().unwrap(),
        "Schedule a follow-up analysis to track progress"
    );
}
