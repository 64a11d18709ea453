//! Scoring Heuristics
//!
//! Pure numeric functions used by the collector, the step runner, and the
//! synthesizer. All scores are in `[0, 1]`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::models::execution::{DataCollectionResult, ExecutionStepResult, StepStatus};

/// Collection results below this score are flagged as quality issues.
pub const LOW_QUALITY_THRESHOLD: f64 = 0.5;

/// Average data quality assumed when a plan declares no data requirements.
pub const NEUTRAL_DATA_QUALITY: f64 = 0.5;

/// Tool calls faster than this earn the latency bonus.
pub const FAST_CALL_MS: u64 = 5_000;

/// Insight count at which the insight term of the quality score saturates.
const INSIGHT_SATURATION: f64 = 5.0;

/// `n / d`, or 0 when `d == 0`, clamped to `[0, 1]`.
pub fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        (n as f64 / d as f64).clamp(0.0, 1.0)
    }
}

/// Score collected data: base 0.5, +0.2 for a non-empty field map, +0.2 when
/// the tool reported `success: true`, +0.1 for a non-empty `result` string.
pub fn collection_quality_score(data: &Map<String, Value>, output: &Value) -> f64 {
    let mut score: f64 = 0.5;
    if !data.is_empty() {
        score += 0.2;
    }
    if output.get("success").and_then(Value::as_bool) == Some(true) {
        score += 0.2;
    }
    if output
        .get("result")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
    {
        score += 0.1;
    }
    score.min(1.0)
}

/// Classify a step from its successful and total tool-call counts.
///
/// Returns the status and the success ratio. A step without tool calls is
/// `Failed` with ratio 0.
pub fn classify_step(successes: usize, total: usize) -> (StepStatus, f64) {
    let status = if total == 0 || successes == 0 {
        StepStatus::Failed
    } else if successes >= total {
        StepStatus::Completed
    } else {
        StepStatus::Partial
    };
    (status, ratio(successes, total))
}

/// Mean collection quality, or the neutral prior when nothing was collected.
pub fn average_data_quality(results: &[DataCollectionResult]) -> f64 {
    if results.is_empty() {
        return NEUTRAL_DATA_QUALITY;
    }
    let sum: f64 = results.iter().map(|r| r.quality_score.clamp(0.0, 1.0)).sum();
    sum / results.len() as f64
}

/// `(completed / attempted + avg_data_quality) / 2`.
pub fn confidence_score(completed: usize, attempted: usize, avg_data_quality: f64) -> f64 {
    ((ratio(completed, attempted) + avg_data_quality.clamp(0.0, 1.0)) / 2.0).clamp(0.0, 1.0)
}

/// Ordinal description of the average data quality.
pub fn data_quality_assessment(avg_data_quality: f64) -> String {
    let text = if avg_data_quality > 0.8 {
        "High quality data collected from reliable sources; findings are well supported"
    } else if avg_data_quality > 0.6 {
        "Good quality data with minor gaps; findings are generally reliable"
    } else if avg_data_quality > 0.4 {
        "Moderate quality data; some findings may need further validation"
    } else {
        "Lower quality data; findings requiring caution before acting on them"
    };
    text.to_string()
}

/// Inputs of the overall execution quality score.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityInputs {
    pub steps_completed: usize,
    pub steps_attempted: usize,
    pub avg_data_quality: f64,
    pub successful_tool_calls: usize,
    pub total_tool_calls: usize,
    pub insight_count: usize,
}

/// Weighted execution quality:
/// `0.4 * step ratio + 0.3 * data quality + 0.2 * tool ratio + 0.1 * insight term`.
pub fn execution_quality_score(inputs: &QualityInputs) -> f64 {
    let steps = ratio(inputs.steps_completed, inputs.steps_attempted);
    let data = inputs.avg_data_quality.clamp(0.0, 1.0);
    let tools = ratio(inputs.successful_tool_calls, inputs.total_tool_calls);
    let insights = (inputs.insight_count as f64 / INSIGHT_SATURATION).min(1.0);
    (0.4 * steps + 0.3 * data + 0.2 * tools + 0.1 * insights).clamp(0.0, 1.0)
}

/// Effectiveness per tool id.
///
/// Within a step, the tool's last call is scored: 0.7 when it succeeded,
/// +0.2 when it ran under `FAST_CALL_MS`, +0.1 when the step derived any
/// insights. Across steps the maximum is kept.
pub fn tool_effectiveness(step_results: &[ExecutionStepResult]) -> BTreeMap<String, f64> {
    let mut effectiveness: BTreeMap<String, f64> = BTreeMap::new();

    for step in step_results {
        let mut last_calls = BTreeMap::new();
        for call in &step.tool_results {
            last_calls.insert(call.tool_id.as_str(), call);
        }

        let step_has_insights = !step.insights().is_empty();
        for (tool_id, call) in last_calls {
            let mut score: f64 = if call.is_success() { 0.7 } else { 0.0 };
            if call.execution_time_ms < FAST_CALL_MS {
                score += 0.2;
            }
            if step_has_insights {
                score += 0.1;
            }
            let score = score.min(1.0);

            effectiveness
                .entry(tool_id.to_string())
                .and_modify(|best| *best = best.max(score))
                .or_insert(score);
        }
    }

    effectiveness
}
