//! Report Rendering
//!
//! Deterministic text and structure built from a `FinalAnalysis`: the
//! markdown executive summary, the sectioned `AnalysisReport`, and the
//! suggested next actions.

use crate::models::execution::{AnalysisReport, FinalAnalysis, ReportSection};
use crate::models::plan::Approach;

/// Confidence below which more data is requested.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

pub fn report_title(approach: Approach) -> String {
    format!("{} Analysis Report", approach.label())
}

/// Render the executive summary as markdown.
pub fn executive_summary(approach: Approach, analysis: &FinalAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", report_title(approach)));
    out.push_str(&format!("**Approach:** {}\n", approach.label()));
    out.push_str(&format!(
        "**Confidence:** {}%\n\n",
        percent(analysis.confidence_score)
    ));

    out.push_str("## Key Findings\n\n");
    push_numbered(&mut out, &analysis.key_findings, "No key findings were produced.");

    out.push_str("\n## Recommendations\n\n");
    push_numbered(
        &mut out,
        &analysis.recommendations,
        "No recommendations were produced.",
    );

    out.push_str("\n## Data Quality\n\n");
    out.push_str(&analysis.data_quality_assessment);
    out.push('\n');

    if let Some(limitations) = &analysis.limitations {
        out.push_str("\n## Limitations\n\n");
        for limitation in limitations {
            out.push_str(&format!("- {}\n", limitation));
        }
    }

    out
}

/// Structured report with the same content as the executive summary.
pub fn build_report(approach: Approach, analysis: &FinalAnalysis) -> AnalysisReport {
    let mut sections = vec![
        ReportSection {
            heading: "Key Findings".to_string(),
            items: analysis.key_findings.clone(),
        },
        ReportSection {
            heading: "Insights".to_string(),
            items: analysis.insights.clone(),
        },
        ReportSection {
            heading: "Recommendations".to_string(),
            items: analysis.recommendations.clone(),
        },
        ReportSection {
            heading: "Data Quality".to_string(),
            items: vec![
                analysis.data_quality_assessment.clone(),
                format!("Confidence: {}%", percent(analysis.confidence_score)),
            ],
        },
    ];
    if let Some(limitations) = &analysis.limitations {
        sections.push(ReportSection {
            heading: "Limitations".to_string(),
            items: limitations.clone(),
        });
    }

    AnalysisReport {
        title: report_title(approach),
        sections,
    }
}

/// Suggested follow-ups for the caller.
pub fn next_actions(approach: Approach, confidence_score: f64) -> Vec<String> {
    let mut actions = vec![
        "Review findings with stakeholders".to_string(),
        "Implement the recommended actions".to_string(),
    ];

    if confidence_score < LOW_CONFIDENCE_THRESHOLD {
        actions.push("Gather additional data to increase confidence in the results".to_string());
    }

    let approach_action = match approach {
        Approach::Descriptive => "Run a diagnostic analysis to explain the observed patterns",
        Approach::Diagnostic => "Address the identified root causes with targeted remediation",
        Approach::Predictive => "Monitor predictions against actual outcomes",
        Approach::Prescriptive => "Pilot the recommended interventions and measure their impact",
        Approach::Exploratory => "Formulate hypotheses for a targeted follow-up analysis",
        Approach::Other => "Validate the findings against an independent data source",
    };
    actions.push(approach_action.to_string());

    actions.push("Schedule a follow-up analysis to track progress".to_string());
    actions
}

fn percent(score: f64) -> u32 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}

fn push_numbered(out: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        out.push_str(empty);
        out.push('\n');
        return;
    }
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, item));
    }
}
