use mailgrade_core::dataset::parse_jsonl_str;
use mailgrade_core::errors::ServiceError;
use mailgrade_core::judge::parse_rating;
use mailgrade_core::model::ModelRole;
use mailgrade_core::providers::llm::fake::FakeClient;
use mailgrade_core::{
    BatchPipeline, CompareOptions, ComparisonPipeline, EditTask, EvalError, JudgeFailurePolicy,
    ModelClient, PromptCatalog, Record, RunOptions,
};
use std::sync::Arc;

const PASS: &str = r#"{"rating": 3, "reasoning": "The edit keeps every fact."}"#;

fn client(fake: &FakeClient, worker: &str) -> ModelClient {
    ModelClient::new(Arc::new(fake.clone()), worker, "judge-model")
}

fn prompts() -> Arc<PromptCatalog> {
    Arc::new(PromptCatalog::builtin().unwrap())
}

fn dataset() -> Vec<Record> {
    parse_jsonl_str(
        r#"{"id": 1, "sender": "ana@example.com", "subject": "Lunch", "content": "Lunch at noon?"}
{"id": 2, "sender": "bo@example.com", "subject": "Report", "content": "Report is late."}
{"id": 3, "content": ""}
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn single_record_lengthen_scores_full_marks() {
    let fake = FakeClient::with_replies("Hi there, how are you?", PASS);
    let report = BatchPipeline::new(prompts(), client(&fake, "gpt-4o-mini"))
        .run(&[Record::new("1", "Hi")], &EditTask::Lengthen, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].edited_text, "Hi there, how are you?");
    assert_eq!(report.average_faithfulness, 3.0);
    assert_eq!(report.average_completeness, 3.0);
    assert_eq!(report.model, "gpt-4o-mini");
}

#[tokio::test]
async fn shorten_keeps_input_order() {
    let fake = FakeClient::offline();
    let report = BatchPipeline::new(prompts(), client(&fake, "w"))
        .run(&dataset(), &EditTask::Shorten, &RunOptions::default())
        .await
        .unwrap();
    let ids: Vec<&str> = report.results.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert!(report.results.iter().all(|r| r.instruction == "shorten"));
}

#[tokio::test]
async fn empty_email_is_sent_as_placeholder() {
    let fake = FakeClient::offline();
    let report = BatchPipeline::new(prompts(), client(&fake, "w"))
        .run(&dataset()[2..], &EditTask::Lengthen, &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.results[0].original_text, "");
    let worker = fake
        .requests()
        .into_iter()
        .find(|r| r.role == ModelRole::Worker)
        .unwrap();
    assert!(worker.messages.iter().any(|m| m.content.contains("Hello World!")));
}

#[tokio::test]
async fn tone_task_is_record_major() {
    let fake = FakeClient::with_replies("edited", PASS);
    let records = vec![Record::new("1", "a"), Record::new("2", "b")];
    let report = BatchPipeline::new(prompts(), client(&fake, "w"))
        .run(
            &records,
            &EditTask::change_tone(["friendly", "professional"]),
            &RunOptions::default(),
        )
        .await
        .unwrap();

    let got: Vec<(&str, &str)> = report
        .results
        .iter()
        .map(|r| (r.record_id.as_str(), r.instruction.as_str()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("1", "change_tone_friendly"),
            ("1", "change_tone_professional"),
            ("2", "change_tone_friendly"),
            ("2", "change_tone_professional"),
        ]
    );
    let rows = report.per_instruction();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.count == 2));
}

#[tokio::test]
async fn malformed_judge_output_aborts_with_partial_report() {
    let raw = "I'd give this a solid three.";
    let fake = FakeClient::with_replies("edited", PASS).with_script([
        Ok("edited".to_string()),
        Ok(PASS.to_string()),
        Ok(PASS.to_string()),
        Ok("edited".to_string()),
        Ok(raw.to_string()),
    ]);

    let err = BatchPipeline::new(prompts(), client(&fake, "w"))
        .run(&dataset(), &EditTask::Shorten, &RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err.source, EvalError::JudgeParse { .. }));
    assert_eq!(err.source.raw_response(), Some(raw));
    assert_eq!(err.record_id.as_deref(), Some("2"));
    assert_eq!(err.partial.results.len(), 1);
    assert_eq!(err.partial.results[0].record_id, "1");
    assert_eq!(err.partial.average_completeness, 3.0);
}

#[tokio::test]
async fn score_zero_policy_finishes_the_run() {
    let fake = FakeClient::from_fn(|req| {
        Ok(match req.role {
            ModelRole::Worker => "edited".to_string(),
            ModelRole::Judge => "```json\nnot quite\n```".to_string(),
        })
    });
    let report = BatchPipeline::new(prompts(), client(&fake, "w"))
        .with_judge_failure_policy(JudgeFailurePolicy::ScoreZero)
        .run(&dataset(), &EditTask::Lengthen, &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.average_faithfulness, 0.0);
    assert_eq!(report.defaulted_ratings(), 6);
    assert!(report.results[0].faithfulness.reasoning.contains("not quite"));
}

#[tokio::test]
async fn comparison_returns_exactly_requested_models() {
    let fake = FakeClient::from_fn(|req| {
        Ok(match (req.role, req.model.as_str()) {
            (ModelRole::Worker, m) => format!("edit from {}", m),
            (ModelRole::Judge, _) => {
                let user = &req.messages[1].content;
                if user.contains("edit from small") {
                    r#"{"rating": 1, "reasoning": "lost details"}"#.to_string()
                } else {
                    PASS.to_string()
                }
            }
        })
    });
    let models = vec!["small".to_string(), "large".to_string()];
    let outcome = ComparisonPipeline::new(prompts(), client(&fake, "ignored"))
        .compare(&dataset(), &EditTask::Shorten, &models, &CompareOptions::default())
        .await
        .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.reports.len(), 2);
    assert_eq!(outcome.reports["small"].average_faithfulness, 1.0);
    assert_eq!(outcome.reports["large"].average_faithfulness, 3.0);
    let ordered: Vec<&str> = outcome
        .ordered_reports()
        .iter()
        .map(|r| r.model.as_str())
        .collect();
    assert_eq!(ordered, vec!["small", "large"]);
    assert!(fake
        .requests()
        .iter()
        .filter(|r| r.role == ModelRole::Judge)
        .all(|r| r.model == "judge-model"));
}

#[tokio::test]
async fn service_failure_is_reported_per_model() {
    let fake = FakeClient::from_fn(|req| match (req.role, req.model.as_str()) {
        (ModelRole::Worker, "offline-model") => {
            Err(ServiceError::new("fake", "offline-model", "connection refused"))
        }
        (ModelRole::Worker, _) => Ok("edited".to_string()),
        (ModelRole::Judge, _) => Ok(PASS.to_string()),
    });
    let models = vec!["offline-model".to_string(), "ok".to_string()];
    let outcome = ComparisonPipeline::new(prompts(), client(&fake, "ignored"))
        .compare(&dataset(), &EditTask::Lengthen, &models, &CompareOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports["ok"].results.len(), 3);
    let failure = outcome.failure("offline-model").unwrap();
    assert_eq!(failure.error.record_id.as_deref(), Some("1"));
    assert!(failure.error.to_string().contains("connection refused"));
}

#[test]
fn judge_parse_rejects_non_conforming_objects() {
    for raw in [
        r#"{"rating": "3", "reasoning": "x"}"#,
        r#"{"rating": 2.5, "reasoning": "x"}"#,
        r#"{"rating": 4, "reasoning": "x"}"#,
        r#"{"rating": 2}"#,
        r#"[{"rating": 2, "reasoning": "x"}]"#,
        "",
        "Sure!\n{\"rating\": 2, \"reasoning\": \"mostly\"}",
        "{\"rating\": 2, \"reasoning\": \"mostly\"} final answer 0",
        r#"{"rating": 3, "reasoning": "a"}{"rating": 0, "reasoning": "b"}"#,
    ] {
        assert!(parse_rating(raw).is_err(), "accepted {raw:?}");
    }
    let fenced = parse_rating("```json\n{\"rating\": 2, \"reasoning\": \"mostly\"}\n```").unwrap();
    assert_eq!(fenced.rating, 2);
}
