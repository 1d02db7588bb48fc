//! Formatted terminal output.
//!
//! Formatting lives in one place so:
//! - the orchestration code stays free of presentation details
//! - output changes are localized

use crate::app::pipeline::{RunSummary, StationOutcome};
use crate::domain::RunPlan;
use crate::report::{ModelEstimate, StageResult};

/// Format the run summary: one row per station, then failures and outputs.
pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== geonoise - {} ===\n", plan_name(summary.plan)));
    out.push_str(&format!(
        "Stations: {} | done={} | failed={}\n\n",
        summary.outcomes.len(),
        summary.completed(),
        summary.failures().count()
    ));

    out.push_str(format!("{:<12} {:>8} {:<23} {:<18}", "station", "missing", "span", "state").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<8} {:-<23} {:-<18}", "", "", "", "").trim_end());
    out.push('\n');
    for outcome in &summary.outcomes {
        out.push_str(&format_station_row(outcome));
        out.push('\n');
    }

    let failures: Vec<&StationOutcome> = summary.failures().collect();
    if !failures.is_empty() {
        out.push_str("\nFailures:\n");
        for outcome in failures {
            if let Some(err) = &outcome.error {
                out.push_str(&format!("- {}: {err}\n", outcome.station));
            }
        }
    }

    if summary.offsets_logged > 0 {
        out.push_str(&format!("\nOffsets logged: {}\n", summary.offsets_logged));
    }
    if !summary.reports.is_empty() {
        out.push_str("\nReports:\n");
        for path in &summary.reports {
            out.push_str(&format!("- {}\n", path.display()));
        }
    }

    out
}

fn format_station_row(outcome: &StationOutcome) -> String {
    let missing = outcome
        .assessment
        .and_then(|a| a.missing_percentage())
        .map(|p| format!("{p:>7.2}%"))
        .unwrap_or_else(|| format!("{:>8}", "-"));
    let span = outcome
        .date_span
        .map(|(first, last)| format!("{first}..{last}"))
        .unwrap_or_else(|| "-".to_string());
    let state = if outcome.error.is_some() {
        format!("failed after {}", outcome.state().label())
    } else {
        outcome.state().label().to_string()
    };

    format!("{:<12} {missing} {span:<23} {state}", truncate(outcome.station.id(), 12))
        .trim_end()
        .to_string()
}

/// Format the fitted noise models of one station.
pub fn format_trend(result: &StageResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("driving noise: {:.4}\n", result.driving_noise));
    for model in &result.models {
        out.push_str(&format!("  {:<18} fraction={:.4}{}\n", model.name, model.fraction, parameters(model)));
    }
    out
}

fn parameters(model: &ModelEstimate) -> String {
    let mut out = String::new();
    for (key, value) in [
        ("d", model.d),
        ("1-phi", model.one_minus_phi),
        ("phi", model.phi),
        ("lambda", model.lambda),
        ("AR1", model.ar1),
    ] {
        if let Some(v) = value {
            out.push_str(&format!(" {key}={v:.6}"));
        }
    }
    out
}

fn plan_name(plan: RunPlan) -> &'static str {
    match plan {
        RunPlan::Curate => "offset curation",
        RunPlan::Analyse => "trend analysis",
        RunPlan::Full => "noise analysis",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
