use super::super::args::CompareArgs;
use super::context::RunContext;
use super::reporting::{model_progress_printer, print_comparison, write_json, ComparisonFile};
use super::spawn_cancel_on_ctrl_c;
use crate::exit_codes;
use anyhow::Context;
use mailgrade_core::{CancelFlag, CompareOptions, ComparisonPipeline};

pub async fn run(args: CompareArgs) -> anyhow::Result<i32> {
    let ctx = RunContext::build(&args.provider, None)?;
    let (path, records) = ctx.load_dataset(&args.dataset)?;
    let task = ctx.task(args.action, &path, &args.tones)?;
    let models = if args.models.is_empty() {
        ctx.config.models.clone()
    } else {
        args.models.clone()
    };
    let judge_model = ctx.client.judge_model().to_string();

    tracing::info!(
        dataset = %path.display(),
        records = records.len(),
        task = task.name(),
        models = %models.join(","),
        "starting comparison"
    );

    let cancel = CancelFlag::new();
    let ctrl_c = spawn_cancel_on_ctrl_c(cancel.clone());
    let options = CompareOptions {
        progress: Some(model_progress_printer()),
        cancel: Some(cancel),
    };

    let pipeline =
        ComparisonPipeline::new(ctx.prompts, ctx.client).with_judge_failure_policy(ctx.policy);
    let outcome = pipeline.compare(&records, &task, &models, &options).await;
    drop(ctrl_c);
    let outcome = outcome.context("invalid comparison request")?;

    print_comparison(&outcome);

    if let Some(out) = &args.output {
        write_json(out, &ComparisonFile::new(task.name(), &judge_model, &outcome))?;
    }

    let code = if outcome.failures.iter().any(|f| f.error.is_cancelled()) {
        exit_codes::CANCELLED
    } else if outcome.is_complete() {
        exit_codes::SUCCESS
    } else {
        exit_codes::RUN_FAILED
    };
    Ok(code)
}
