//! Plain-text rendering of ratings and reports. Everything here returns
//! strings; writing them out is up to the caller.

use crate::model::{EditResult, Rating, MAX_RATING};
use crate::report::AggregateReport;
use std::fmt::Write as _;

/// Width of a full-score bar in [`format_bar_chart`].
const BAR_WIDTH: usize = 30;

#[must_use]
pub fn format_progress_line(done: usize, total: usize, model: Option<&str>) -> String {
    match model {
        Some(m) => format!("Processed {}/{} email records using {}", done, total, m),
        None => format!("Processed {}/{} email records", done, total),
    }
}

/// The "Scores of Evaluation" block for one edit.
#[must_use]
pub fn format_scores(faithfulness: &Rating, completeness: &Rating) -> String {
    format!(
        "Faithfulness\nRating: {}\nReasoning: {}\n\nCompleteness\nRating: {}\nReasoning: {}",
        faithfulness.rating, faithfulness.reasoning, completeness.rating, completeness.reasoning
    )
}

#[must_use]
pub fn format_result(result: &EditResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Email ID: {} ({})", result.record_id, result.instruction);
    let _ = writeln!(out, "--- Original Email ---\n{}", result.original_text.trim_end());
    let _ = writeln!(out, "--- Edited Email ---\n{}", result.edited_text.trim_end());
    let _ = writeln!(out, "--- Scores of Evaluation ---");
    out.push_str(&format_scores(&result.faithfulness, &result.completeness));
    if result.judge_fallbacks > 0 {
        let _ = write!(
            out,
            "\n(note: {} rating(s) defaulted to 0 after unparseable judge output)",
            result.judge_fallbacks
        );
    }
    out
}

/// Averages plus the per-instruction breakdown for one run.
#[must_use]
pub fn format_summary(report: &AggregateReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Average Scores of Evaluation (0-{} Scale) for {}",
        MAX_RATING, report.model
    );
    let _ = writeln!(out, "  Faithfulness: {:.2}", report.average_faithfulness);
    let _ = writeln!(out, "  Completeness: {:.2}", report.average_completeness);
    let rows = report.per_instruction();
    if rows.len() > 1 {
        let _ = writeln!(out, "By instruction:");
        for row in rows {
            let _ = writeln!(
                out,
                "  {:<28} n={:<4} faithfulness={:.2} completeness={:.2}",
                row.instruction, row.count, row.average_faithfulness, row.average_completeness
            );
        }
    }
    let defaulted = report.defaulted_ratings();
    if defaulted > 0 {
        let _ = writeln!(out, "  ({} rating(s) defaulted to 0)", defaulted);
    }
    out
}

/// Model / Faithfulness / Completeness table, one row per report.
#[must_use]
pub fn format_score_table(reports: &[&AggregateReport]) -> String {
    let width = reports
        .iter()
        .map(|r| r.model.len())
        .max()
        .unwrap_or(0)
        .max("Model".len());
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:>12}  {:>12}",
        "Model",
        "Faithfulness",
        "Completeness",
        width = width
    );
    for r in reports {
        let _ = writeln!(
            out,
            "{:<width$}  {:>12.2}  {:>12.2}",
            r.model,
            r.average_faithfulness,
            r.average_completeness,
            width = width
        );
    }
    out
}

/// Horizontal bars on the 0..=3 scale, faithfulness rows first, then completeness.
#[must_use]
pub fn format_bar_chart(reports: &[&AggregateReport]) -> String {
    let label_width = reports
        .iter()
        .map(|r| r.model.len())
        .max()
        .unwrap_or(0)
        + "Faithfulness ()".len();
    let axes: [(&str, fn(&AggregateReport) -> f64); 2] = [
        ("Faithfulness", |r| r.average_faithfulness),
        ("Completeness", |r| r.average_completeness),
    ];
    let mut out = String::new();
    for (axis, pick) in axes {
        for r in reports {
            let score = pick(r);
            let label = format!("{} ({})", axis, r.model);
            let _ = writeln!(
                out,
                "{:<label_width$} |{} {:.2}",
                label,
                bar(score),
                score,
                label_width = label_width
            );
        }
    }
    out
}

fn bar(score: f64) -> String {
    let clamped = score.clamp(0.0, f64::from(MAX_RATING));
    let filled = ((clamped / f64::from(MAX_RATING)) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}
