use super::super::args::{Action, EditArgs};
use super::context::RunContext;
use super::reporting::record_header;
use crate::exit_codes;
use mailgrade_core::dataset::{find_record, record_ids};
use mailgrade_core::report::console::format_result;
use mailgrade_core::{BatchPipeline, Instruction};

pub async fn run(args: EditArgs) -> anyhow::Result<i32> {
    let ctx = RunContext::build(&args.provider, args.model.as_deref())?;
    let (path, records) = ctx.load_dataset(&args.dataset)?;

    let Some(found) = find_record(&records, &args.id) else {
        anyhow::bail!(
            "no record with id '{}' in {}; available ids: {}",
            args.id,
            path.display(),
            record_ids(&records).join(", ")
        );
    };
    let mut record = found.clone();
    if let Some(text) = args.text {
        record.content = text;
    }

    let instruction = match args.action {
        Action::Lengthen => Instruction::Lengthen,
        Action::Shorten => Instruction::Shorten,
        Action::Tone => {
            if args.tone.trim().is_empty() {
                anyhow::bail!("--tone must not be empty");
            }
            Instruction::ChangeTone(args.tone)
        }
    };

    let pipeline = BatchPipeline::new(ctx.prompts, ctx.client).with_judge_failure_policy(ctx.policy);
    match pipeline.evaluate(&record, &instruction).await {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", record_header(&record));
                println!("{}", format_result(&result));
            }
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: editing record '{}' with {} failed: {}", record.id, pipeline.model(), e);
            Ok(exit_codes::RUN_FAILED)
        }
    }
}
