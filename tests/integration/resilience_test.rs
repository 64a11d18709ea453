//! Resilience Tests
//!
//! Retry with backoff, per-call timeouts, the run deadline, cancellation,
//! and opt-in concurrency. All tests run on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use analyst_executor::models::execution::StepStatus;
use analyst_executor::models::plan::{StepType, ToolCall};
use analyst_executor::{
    AnalysisPlan, AnalysisStep, Approach, DataRequirement, DataSourceKind, ExecutorConfig,
    RuntimeAdjustments,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::fixtures::{executor, no_retry_config, MockTool};

fn single_step(tool: &str) -> AnalysisPlan {
    AnalysisPlan::new(Approach::Descriptive)
        .with_step(AnalysisStep::new("s1", StepType::Analysis).with_tool_call(ToolCall::new(tool)))
}

// ============================================================================
// Retries
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let flaky = Arc::new(MockTool::flaky("flaky", 2, json!({"insights": ["recovered"]})));
    let executor = executor(vec![flaky.clone()], ExecutorConfig::default());

    let output = executor.execute(&single_step("flaky"), None).await.unwrap();
    let call = &output.step_results[0].tool_results[0];

    assert!(call.error.is_none());
    assert_eq!(call.attempts, 3);
    assert_eq!(flaky.calls(), 3);
    // 200ms + 400ms of backoff
    assert!(call.execution_time_ms >= 600);
    assert_eq!(output.step_results[0].status, StepStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_bounded() {
    let flaky = Arc::new(MockTool::flaky("flaky", 5, json!({})));
    let config = ExecutorConfig {
        retry_attempts: 1,
        ..ExecutorConfig::default()
    };
    let executor = executor(vec![flaky.clone()], config);

    let output = executor.execute(&single_step("flaky"), None).await.unwrap();
    let call = &output.step_results[0].tool_results[0];

    assert_eq!(call.attempts, 2);
    assert_eq!(flaky.calls(), 2);
    assert_eq!(call.error.as_deref(), Some("Tool error: transient failure #2"));
}

#[tokio::test(start_paused = true)]
async fn test_collection_retries_use_the_same_policy() {
    let flaky = Arc::new(MockTool::flaky("postgres", 1, json!({"success": true})));
    let executor = executor(vec![flaky.clone()], ExecutorConfig::default());
    let plan = AnalysisPlan::new(Approach::Descriptive)
        .with_requirement(DataRequirement::new("sales", DataSourceKind::DatabaseQuery));

    let output = executor.execute(&plan, None).await.unwrap();
    assert_eq!(flaky.calls(), 2);
    assert!((output.collection_results[0].quality_score - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_panicking_tool_keeps_partial_results() {
    let good = Arc::new(MockTool::with_insights("good", &["revenue up 4%"]));
    let panicky = Arc::new(MockTool::new("panicky", |_, input| {
        let rows: Vec<serde_json::Value> = Vec::new();
        Ok(rows[input["row"].as_u64().unwrap_or(3) as usize].clone())
    }));
    let after = Arc::new(MockTool::ok("after", json!({})));
    let executor = executor(
        vec![good, panicky.clone(), after.clone()],
        ExecutorConfig::default(),
    );
    let plan = AnalysisPlan::new(Approach::Descriptive)
        .with_step(
            AnalysisStep::new("s1", StepType::Analysis)
                .with_tool_call(ToolCall::new("good"))
                .with_tool_call(ToolCall::new("panicky")),
        )
        .with_step(AnalysisStep::new("s2", StepType::Analysis).with_tool_call(ToolCall::new("after")));

    let output = tokio::spawn(async move { executor.execute(&plan, None).await })
        .await
        .expect("a tool panic must not abort the run")
        .unwrap();

    let step = &output.step_results[0];
    assert_eq!(step.status, StepStatus::Partial);
    assert!(step.tool_results[0].error.is_none());
    assert_eq!(
        step.tool_results[1].error.as_deref(),
        Some("Internal error: Tool 'panicky' panicked")
    );
    assert_eq!(step.tool_results[1].attempts, 1);
    assert_eq!(panicky.calls(), 1);
    assert_eq!(output.step_results[1].status, StepStatus::Completed);
    assert_eq!(after.calls(), 1);
    assert_eq!(output.final_analysis.insights, vec!["revenue up 4%"]);
}

// ============================================================================
// Timeouts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_hung_tool_times_out() {
    let slow = Arc::new(MockTool::ok("slow", json!({})).delayed(Duration::from_secs(60)));
    let config = ExecutorConfig {
        timeout_ms: 100,
        ..no_retry_config()
    };
    let executor = executor(vec![slow], config);

    let output = executor.execute(&single_step("slow"), None).await.unwrap();
    let call = &output.step_results[0].tool_results[0];

    assert_eq!(call.error.as_deref(), Some("Tool 'slow' timed out after 100ms"));
    assert_eq!(output.step_results[0].status, StepStatus::Failed);
    assert!(output.summary.execution_time_ms < 1_000);
}

#[tokio::test(start_paused = true)]
async fn test_run_deadline_bounds_the_whole_run() {
    let slow = Arc::new(MockTool::ok("slow", json!({})).delayed(Duration::from_secs(60)));
    let config = ExecutorConfig {
        timeout_ms: 1_000,
        run_timeout_ms: Some(150),
        ..no_retry_config()
    };
    let executor = executor(vec![slow.clone()], config);
    let plan = single_step("slow")
        .with_step(AnalysisStep::new("s2", StepType::Analysis).with_tool_call(ToolCall::new("slow")));

    let output = executor.execute(&plan, None).await.unwrap();

    assert_eq!(
        output.step_results[0].tool_results[0].error.as_deref(),
        Some("Tool 'slow' timed out after 150ms")
    );
    assert_eq!(
        output.step_results[1].tool_results[0].error.as_deref(),
        Some("Run deadline exceeded")
    );
    assert_eq!(output.step_results[1].tool_results[0].attempts, 0);
    assert_eq!(slow.calls(), 1);
    assert_eq!(output.summary.failed_steps, 2);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancellation_stops_remaining_steps() {
    let token = CancellationToken::new();
    let stopper = Arc::new(MockTool::with_insights("stopper", &["stop requested"]).cancelling(token.clone()));
    let after = Arc::new(MockTool::ok("after", json!({})));
    let executor = executor(vec![stopper, after.clone()], no_retry_config())
        .with_cancellation_token(token.clone());
    let plan = single_step("stopper")
        .with_step(AnalysisStep::new("s2", StepType::Analysis).with_tool_call(ToolCall::new("after")));

    let output = executor.execute(&plan, None).await.unwrap();

    assert_eq!(output.step_results.len(), 1);
    assert_eq!(output.step_results[0].status, StepStatus::Completed);
    assert_eq!(after.calls(), 0);
    assert!(output.summary.cancelled);
    assert_eq!(output.summary.executed_steps, 1);
    assert_eq!(output.summary.total_steps, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_a_running_tool() {
    let slow = Arc::new(MockTool::ok("slow", json!({})).delayed(Duration::from_secs(60)));
    let executor = executor(vec![slow], no_retry_config());
    let token = executor.cancellation_token();

    let run = async { executor.execute(&single_step("slow"), None).await };
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    };
    let (output, _) = tokio::join!(run, cancel);
    let output = output.unwrap();

    assert_eq!(
        output.step_results[0].tool_results[0].error.as_deref(),
        Some("Execution cancelled")
    );
    assert!(output.summary.cancelled);
}

// ============================================================================
// Concurrency
// ============================================================================

fn three_slow_calls() -> (Vec<Arc<MockTool>>, AnalysisPlan) {
    let tools = vec![
        Arc::new(MockTool::with_insights("a", &["from a"]).delayed(Duration::from_secs(1))),
        Arc::new(MockTool::with_insights("b", &["from b"]).delayed(Duration::from_secs(1))),
        Arc::new(MockTool::with_insights("c", &["from c"]).delayed(Duration::from_secs(1))),
    ];
    let plan = AnalysisPlan::new(Approach::Descriptive).with_step(
        AnalysisStep::new("s1", StepType::Analysis)
            .with_tool_call(ToolCall::new("c"))
            .with_tool_call(ToolCall::new("a"))
            .with_tool_call(ToolCall::new("b")),
    );
    (tools, plan)
}

#[tokio::test(start_paused = true)]
async fn test_sequential_tool_calls_by_default() {
    let (tools, plan) = three_slow_calls();
    let output = executor(tools, no_retry_config())
        .execute(&plan, None)
        .await
        .unwrap();
    assert!(output.summary.execution_time_ms >= 3_000);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_tool_calls_keep_declaration_order() {
    let (tools, plan) = three_slow_calls();
    let config = ExecutorConfig {
        concurrent_tool_calls: true,
        ..no_retry_config()
    };
    let output = executor(tools, config).execute(&plan, None).await.unwrap();

    assert!(output.summary.execution_time_ms < 2_000);
    let ids: Vec<&str> = output.step_results[0]
        .tool_results
        .iter()
        .map(|r| r.tool_id.as_str())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(
        output.final_analysis.key_findings,
        vec!["from c", "from a", "from b"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_priority_override_is_recorded() {
    let executor = executor(vec![Arc::new(MockTool::ok("a", json!({})))], no_retry_config());
    let adjustments = RuntimeAdjustments::default().with_priority("thoroughness");
    let output = executor
        .execute(&single_step("a"), Some(&adjustments))
        .await
        .unwrap();
    assert_eq!(output.metadata.priority.as_deref(), Some("thoroughness"));
}
