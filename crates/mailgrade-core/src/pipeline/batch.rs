use super::{JudgeFailurePolicy, RunOptions};
use crate::client::ModelClient;
use crate::edit::EditOperation;
use crate::errors::{BatchRunError, EvalError};
use crate::judge::JudgeOperation;
use crate::model::{EditResult, EditTask, Instruction, Rating, Record};
use crate::prompts::PromptCatalog;
use crate::report::progress::ProgressEvent;
use crate::report::AggregateReport;
use std::sync::Arc;

/// Edits and judges a collection of records with one worker model.
///
/// Records are processed in input order and, within a record, instructions in
/// task order. Each `run` owns its accumulator; nothing carries over between
/// runs.
#[derive(Clone)]
pub struct BatchPipeline {
    editor: EditOperation,
    judge: JudgeOperation,
    model: String,
    policy: JudgeFailurePolicy,
}

impl BatchPipeline {
    pub fn new(prompts: Arc<PromptCatalog>, client: ModelClient) -> Self {
        Self {
            model: client.worker_model().to_string(),
            editor: EditOperation::new(Arc::clone(&prompts), client.clone()),
            judge: JudgeOperation::new(prompts, client),
            policy: JudgeFailurePolicy::default(),
        }
    }

    pub fn with_judge_failure_policy(mut self, policy: JudgeFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn judge_failure_policy(&self) -> JudgeFailurePolicy {
        self.policy
    }

    /// Edit one record and score the edit on both axes.
    pub async fn evaluate(
        &self,
        record: &Record,
        instruction: &Instruction,
    ) -> Result<EditResult, EvalError> {
        let tag = instruction.tag();
        let edited = self.editor.apply(instruction, &record.content).await?;

        let mut fallbacks = 0;
        let faithfulness = self.settle(
            self.judge.judge_faithfulness(&record.content, &edited).await,
            &mut fallbacks,
        )?;
        let completeness = self.settle(
            self.judge
                .judge_completeness(&tag, &record.content, &edited)
                .await,
            &mut fallbacks,
        )?;

        tracing::debug!(
            record_id = %record.id,
            instruction = %tag,
            model = %self.model,
            faithfulness = faithfulness.rating,
            completeness = completeness.rating,
            "record evaluated"
        );

        Ok(EditResult {
            record_id: record.id.clone(),
            instruction: tag,
            original_text: record.content.clone(),
            edited_text: edited,
            faithfulness,
            completeness,
            judge_fallbacks: fallbacks,
        })
    }

    fn settle(
        &self,
        judged: Result<Rating, EvalError>,
        fallbacks: &mut u32,
    ) -> Result<Rating, EvalError> {
        match (judged, self.policy) {
            (Err(EvalError::JudgeParse { raw, reason }), JudgeFailurePolicy::ScoreZero) => {
                *fallbacks += 1;
                Ok(Rating::unparsed(reason, &raw))
            }
            (other, _) => other,
        }
    }

    /// Runs `task` over `records`.
    ///
    /// Any error stops the run; the returned [`BatchRunError`] holds every
    /// result produced before the failing call, including earlier tones of
    /// the failing record.
    pub async fn run(
        &self,
        records: &[Record],
        task: &EditTask,
        options: &RunOptions,
    ) -> Result<AggregateReport, BatchRunError> {
        let instructions = task.instructions().map_err(|source| BatchRunError {
            record_id: None,
            instruction: None,
            source,
            partial: AggregateReport::from_results(self.model.as_str(), Vec::new()),
        })?;

        let total = records.len();
        let mut results = Vec::with_capacity(total * instructions.len());

        for (index, record) in records.iter().enumerate() {
            if options.cancelled() {
                tracing::debug!(model = %self.model, done = index, total, "run cancelled");
                return Err(BatchRunError {
                    record_id: None,
                    instruction: None,
                    source: EvalError::Cancelled,
                    partial: AggregateReport::from_results(self.model.as_str(), results),
                });
            }

            for instruction in &instructions {
                match self.evaluate(record, instruction).await {
                    Ok(result) => results.push(result),
                    Err(source) => {
                        return Err(BatchRunError {
                            record_id: Some(record.id.clone()),
                            instruction: Some(instruction.tag()),
                            source,
                            partial: AggregateReport::from_results(self.model.as_str(), results),
                        });
                    }
                }
            }

            if let Some(sink) = &options.progress {
                sink(ProgressEvent {
                    done: index + 1,
                    total,
                });
            }
        }

        Ok(AggregateReport::from_results(self.model.as_str(), results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelRole, Role};
    use crate::pipeline::CancelFlag;
    use crate::providers::llm::fake::FakeClient;
    use std::sync::Mutex;

    const PASS: &str = r#"{"rating": 3, "reasoning": "fine"}"#;

    fn pipeline(fake: &FakeClient) -> BatchPipeline {
        BatchPipeline::new(
            Arc::new(PromptCatalog::builtin().unwrap()),
            ModelClient::new(Arc::new(fake.clone()), "worker", "judge"),
        )
    }

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| Record::new(*id, format!("body {id}"))).collect()
    }

    #[tokio::test]
    async fn evaluate_runs_edit_then_both_judges() {
        let fake = FakeClient::with_replies("edited", PASS);
        let result = pipeline(&fake)
            .evaluate(&Record::new("1", "Hi"), &Instruction::Shorten)
            .await
            .unwrap();
        assert_eq!(result.edited_text, "edited");
        assert_eq!(result.original_text, "Hi");
        assert_eq!(result.instruction, "shorten");

        let sent = fake.requests();
        let roles: Vec<ModelRole> = sent.iter().map(|r| r.role).collect();
        assert_eq!(roles, vec![ModelRole::Worker, ModelRole::Judge, ModelRole::Judge]);
        let completeness_prompt = &sent[2].messages.iter().find(|m| m.role == Role::User).unwrap().content;
        assert!(completeness_prompt.contains("shorten"));
        assert!(completeness_prompt.contains("edited"));
    }

    #[tokio::test]
    async fn score_zero_policy_defaults_unparseable_axis() {
        let fake = FakeClient::with_replies("edited", PASS)
            .with_script([Ok("edited".to_string()), Ok("garbage".to_string())]);
        let result = pipeline(&fake)
            .with_judge_failure_policy(JudgeFailurePolicy::ScoreZero)
            .evaluate(&Record::new("1", "Hi"), &Instruction::Lengthen)
            .await
            .unwrap();
        assert_eq!(result.faithfulness.rating, 0);
        assert!(result.faithfulness.reasoning.contains("unparseable"));
        assert!(result.faithfulness.reasoning.contains("raw: \"garbage\""));
        assert_eq!(result.completeness.rating, 3);
        assert_eq!(result.judge_fallbacks, 1);
    }

    #[tokio::test]
    async fn score_zero_policy_still_fails_on_service_errors() {
        let fake = FakeClient::with_replies("edited", PASS).with_script([Err(
            crate::errors::ServiceError::new("fake", "worker", "down"),
        )]);
        let err = pipeline(&fake)
            .with_judge_failure_policy(JudgeFailurePolicy::ScoreZero)
            .run(&records(&["1"]), &EditTask::Shorten, &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err.source, EvalError::Service(_)));
        assert_eq!(err.record_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn progress_is_reported_per_record_not_per_tone() {
        let fake = FakeClient::with_replies("edited", PASS);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let options = RunOptions::default().with_progress(Arc::new(move |ev: ProgressEvent| {
            sink_seen.lock().unwrap().push((ev.done, ev.total));
        }));

        let report = pipeline(&fake)
            .run(
                &records(&["1", "2", "3"]),
                &EditTask::change_tone(["friendly", "professional"]),
                &options,
            )
            .await
            .unwrap();
        assert_eq!(report.results.len(), 6);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn failure_mid_record_keeps_earlier_tones() {
        // record 1: edit, judge, judge (friendly) then edit (professional) and a bad judge
        let fake = FakeClient::with_replies("edited", PASS).with_script([
            Ok("e1".to_string()),
            Ok(PASS.to_string()),
            Ok(PASS.to_string()),
            Ok("e2".to_string()),
            Ok("not json".to_string()),
        ]);
        let err = pipeline(&fake)
            .run(
                &records(&["1", "2"]),
                &EditTask::change_tone(["friendly", "professional"]),
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.record_id.as_deref(), Some("1"));
        assert_eq!(err.instruction.as_deref(), Some("change_tone_professional"));
        assert_eq!(err.source.raw_response(), Some("not json"));
        assert_eq!(err.partial.results.len(), 1);
        assert_eq!(err.partial.results[0].instruction, "change_tone_friendly");
        assert_eq!(err.partial.average_faithfulness, 3.0);
    }

    #[tokio::test]
    async fn cancel_stops_before_next_record() {
        let fake = FakeClient::with_replies("edited", PASS);
        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        let options = RunOptions::default()
            .with_cancel(cancel)
            .with_progress(Arc::new(move |ev: ProgressEvent| {
                if ev.done == 2 {
                    trigger.cancel();
                }
            }));

        let err = pipeline(&fake)
            .run(&records(&["1", "2", "3", "4"]), &EditTask::Lengthen, &options)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.record_id, None);
        let ids: Vec<&str> = err.partial.results.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(fake.requests().len(), 6);
    }

    #[tokio::test]
    async fn empty_tone_list_fails_before_any_call() {
        let fake = FakeClient::with_replies("edited", PASS);
        let err = pipeline(&fake)
            .run(
                &records(&["1"]),
                &EditTask::change_tone(Vec::<String>::new()),
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.source, EvalError::InvalidRequest(_)));
        assert!(err.partial.results.is_empty());
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_input_yields_zero_averages_and_no_progress() {
        let fake = FakeClient::with_replies("edited", PASS);
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let options = RunOptions::default().with_progress(Arc::new(move |_: ProgressEvent| {
            *counter.lock().unwrap() += 1;
        }));
        let report = pipeline(&fake)
            .run(&[], &EditTask::Shorten, &options)
            .await
            .unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.average_faithfulness, 0.0);
        assert_eq!(report.average_completeness, 0.0);
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(report.model, "worker");
    }
}
