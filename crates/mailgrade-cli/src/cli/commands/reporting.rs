//! Console and JSON output for the edit/generate/compare commands.

use anyhow::Context;
use mailgrade_core::report::console::{
    format_bar_chart, format_progress_line, format_result, format_score_table, format_summary,
};
use mailgrade_core::report::progress::{ModelProgressSink, ProgressEvent, ProgressSink};
use mailgrade_core::{AggregateReport, BatchRunError, ComparisonReport, Record};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// `Processed i/N email records` on stderr, one line per record.
pub fn progress_printer() -> ProgressSink {
    Arc::new(|ev: ProgressEvent| {
        eprintln!("{}", format_progress_line(ev.done, ev.total, None));
    })
}

pub fn model_progress_printer() -> ModelProgressSink {
    Arc::new(|model: &str, ev: ProgressEvent| {
        eprintln!("{}", format_progress_line(ev.done, ev.total, Some(model)));
    })
}

pub fn record_header(record: &Record) -> String {
    format!(
        "From: {}\nSubject: {}",
        record.sender.as_deref().unwrap_or("(unknown)"),
        record.subject.as_deref().unwrap_or("(no subject)")
    )
}

pub fn print_report(report: &AggregateReport, summary_only: bool) {
    if !summary_only {
        for result in &report.results {
            println!("{}\n", format_result(result));
        }
    }
    print!("{}", format_summary(report));
}

pub fn print_run_failure(err: &BatchRunError) {
    eprintln!("error: {}", err);
    if let Some(raw) = err.source.raw_response() {
        eprintln!("judge response was: {}", raw);
    }
    if !err.partial.results.is_empty() {
        println!(
            "Partial results ({} completed before the run stopped):",
            err.partial.results.len()
        );
    }
}

pub fn print_comparison(outcome: &ComparisonReport) {
    let reports = outcome.ordered_reports();
    if !reports.is_empty() {
        println!("{}", format_score_table(&reports));
        print!("{}", format_bar_chart(&reports));
    }
    for failure in &outcome.failures {
        println!("\n{} did not finish: {}", failure.model, failure.error.source);
        if !failure.error.partial.results.is_empty() {
            print!("{}", format_summary(&failure.error.partial));
        }
    }
    if !outcome.skipped.is_empty() {
        println!("\nSkipped after cancellation: {}", outcome.skipped.join(", "));
    }
}

#[derive(Serialize)]
pub struct RunFile<'a> {
    pub generated_at: String,
    pub task: &'a str,
    pub judge_model: &'a str,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub report: &'a AggregateReport,
}

#[derive(Serialize)]
pub struct ComparisonFile<'a> {
    pub generated_at: String,
    pub task: &'a str,
    pub judge_model: &'a str,
    pub models: &'a [String],
    pub reports: Vec<&'a AggregateReport>,
    pub failures: Vec<FailureEntry<'a>>,
    pub skipped: &'a [String],
}

#[derive(Serialize)]
pub struct FailureEntry<'a> {
    pub model: &'a str,
    pub error: String,
    pub partial: &'a AggregateReport,
}

impl<'a> ComparisonFile<'a> {
    pub fn new(task: &'a str, judge_model: &'a str, outcome: &'a ComparisonReport) -> Self {
        Self {
            generated_at: timestamp(),
            task,
            judge_model,
            models: &outcome.models,
            reports: outcome.ordered_reports(),
            failures: outcome
                .failures
                .iter()
                .map(|f| FailureEntry {
                    model: &f.model,
                    error: f.error.source.to_string(),
                    partial: &f.error.partial,
                })
                .collect(),
            skipped: &outcome.skipped,
        }
    }
}

pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("Report written to {}", path.display());
    Ok(())
}
