use super::super::args::GenerateArgs;
use super::context::RunContext;
use super::reporting::{print_report, print_run_failure, progress_printer, timestamp, write_json, RunFile};
use super::spawn_cancel_on_ctrl_c;
use crate::exit_codes;
use mailgrade_core::{BatchPipeline, CancelFlag, RunOptions};

pub async fn run(args: GenerateArgs) -> anyhow::Result<i32> {
    let ctx = RunContext::build(&args.provider, args.model.as_deref())?;
    let (path, records) = ctx.load_dataset(&args.dataset)?;
    let task = ctx.task(args.action, &path, &args.tones)?;
    let judge_model = ctx.client.judge_model().to_string();

    tracing::info!(
        dataset = %path.display(),
        records = records.len(),
        task = task.name(),
        "starting batch"
    );

    let cancel = CancelFlag::new();
    let ctrl_c = spawn_cancel_on_ctrl_c(cancel.clone());
    let options = RunOptions::default()
        .with_progress(progress_printer())
        .with_cancel(cancel);

    let pipeline = BatchPipeline::new(ctx.prompts, ctx.client).with_judge_failure_policy(ctx.policy);
    let outcome = pipeline.run(&records, &task, &options).await;
    drop(ctrl_c);

    let (report, error, code) = match &outcome {
        Ok(report) => (report, None, exit_codes::SUCCESS),
        Err(err) => {
            print_run_failure(err);
            let code = if err.is_cancelled() {
                exit_codes::CANCELLED
            } else {
                exit_codes::RUN_FAILED
            };
            (&err.partial, Some(err.to_string()), code)
        }
    };

    print_report(report, args.summary_only);

    if let Some(out) = &args.output {
        let file = RunFile {
            generated_at: timestamp(),
            task: task.name(),
            judge_model: &judge_model,
            completed: error.is_none(),
            error,
            report,
        };
        write_json(out, &file)?;
    }
    Ok(code)
}
