use super::{BatchPipeline, CancelFlag, JudgeFailurePolicy, RunOptions};
use crate::client::ModelClient;
use crate::errors::{BatchRunError, EvalError};
use crate::model::{EditTask, Record};
use crate::prompts::PromptCatalog;
use crate::report::progress::{ModelProgressSink, ProgressEvent};
use crate::report::AggregateReport;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CompareOptions {
    pub progress: Option<ModelProgressSink>,
    pub cancel: Option<CancelFlag>,
}

/// A model whose batch run did not complete.
#[derive(Debug, Clone)]
pub struct ModelFailure {
    pub model: String,
    pub error: BatchRunError,
}

/// Side-by-side outcome of a comparison.
#[derive(Debug, Clone, Default)]
pub struct ComparisonReport {
    /// Models in the order they were requested.
    pub models: Vec<String>,
    /// Completed runs keyed by model id.
    pub reports: BTreeMap<String, AggregateReport>,
    /// Runs that stopped early, in run order; each carries its partial report.
    pub failures: Vec<ModelFailure>,
    /// Models never started because the comparison was cancelled.
    pub skipped: Vec<String>,
}

impl ComparisonReport {
    /// Completed reports in requested model order.
    pub fn ordered_reports(&self) -> Vec<&AggregateReport> {
        self.models
            .iter()
            .filter_map(|m| self.reports.get(m))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn failure(&self, model: &str) -> Option<&ModelFailure> {
        self.failures.iter().find(|f| f.model == model)
    }
}

/// Runs the same batch once per worker model against a fixed judge.
#[derive(Clone)]
pub struct ComparisonPipeline {
    prompts: Arc<PromptCatalog>,
    client: ModelClient,
    policy: JudgeFailurePolicy,
}

impl ComparisonPipeline {
    /// `client` supplies the transport and the judge model; its worker model
    /// is replaced for every compared model.
    pub fn new(prompts: Arc<PromptCatalog>, client: ModelClient) -> Self {
        Self {
            prompts,
            client,
            policy: JudgeFailurePolicy::default(),
        }
    }

    pub fn with_judge_failure_policy(mut self, policy: JudgeFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn judge_model(&self) -> &str {
        self.client.judge_model()
    }

    /// Runs `task` over `records` for each model in order. A failing model is
    /// recorded in [`ComparisonReport::failures`] and the next model still
    /// runs; cancellation stops the comparison.
    pub async fn compare(
        &self,
        records: &[Record],
        task: &EditTask,
        models: &[String],
        options: &CompareOptions,
    ) -> Result<ComparisonReport, EvalError> {
        if models.is_empty() {
            return Err(EvalError::InvalidRequest(
                "comparison needs at least one model".into(),
            ));
        }
        let mut seen = BTreeSet::new();
        for m in models {
            if m.trim().is_empty() {
                return Err(EvalError::InvalidRequest("model ids must not be empty".into()));
            }
            if !seen.insert(m.as_str()) {
                return Err(EvalError::InvalidRequest(format!(
                    "model '{}' listed more than once",
                    m
                )));
            }
        }
        task.instructions()?;

        let mut outcome = ComparisonReport {
            models: models.to_vec(),
            ..Default::default()
        };

        for (i, model) in models.iter().enumerate() {
            let pipeline =
                BatchPipeline::new(Arc::clone(&self.prompts), self.client.with_worker_model(model))
                    .with_judge_failure_policy(self.policy);

            let mut run_options = RunOptions {
                progress: None,
                cancel: options.cancel.clone(),
            };
            if let Some(sink) = &options.progress {
                let sink = Arc::clone(sink);
                let model = model.clone();
                run_options.progress = Some(Arc::new(move |ev: ProgressEvent| sink(&model, ev)));
            }

            tracing::debug!(model = %model, judge_model = self.client.judge_model(), "comparison run started");
            match pipeline.run(records, task, &run_options).await {
                Ok(report) => {
                    outcome.reports.insert(model.clone(), report);
                }
                Err(error) => {
                    let cancelled = error.is_cancelled();
                    outcome.failures.push(ModelFailure {
                        model: model.clone(),
                        error,
                    });
                    if cancelled {
                        outcome.skipped = models[i + 1..].to_vec();
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }
}
