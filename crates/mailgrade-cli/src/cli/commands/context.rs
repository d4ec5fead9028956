use super::super::args::{Action, ProviderArgs};
use anyhow::{bail, Context};
use mailgrade_core::config::AppConfig;
use mailgrade_core::dataset;
use mailgrade_core::providers::llm::fake::FakeClient;
use mailgrade_core::providers::llm::openai::OpenAIClient;
use mailgrade_core::providers::llm::LlmClient;
use mailgrade_core::{EditTask, JudgeFailurePolicy, ModelClient, PromptCatalog, Record};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs before it can start calling models.
pub struct RunContext {
    pub config: AppConfig,
    pub prompts: Arc<PromptCatalog>,
    pub client: ModelClient,
    pub policy: JudgeFailurePolicy,
}

impl RunContext {
    /// Loads config and prompts and builds the transport. `worker_model`
    /// falls back to the config's `default_model`.
    pub fn build(args: &ProviderArgs, worker_model: Option<&str>) -> anyhow::Result<Self> {
        let config = AppConfig::load_or_default(args.config.as_deref())
            .context("failed to load config")?;

        let prompts = match &args.prompts {
            Some(path) => PromptCatalog::from_path(path),
            None => config.prompt_catalog(),
        }
        .context("failed to load prompts")?;
        let missing = prompts.missing_required();
        if !missing.is_empty() {
            let names: Vec<String> = missing
                .iter()
                .map(|(name, variant)| format!("{}.{}", name, variant))
                .collect();
            bail!("prompt catalog is missing: {}", names.join(", "));
        }

        let transport = build_transport(args, &config)?;
        let judge_model = args
            .judge_model
            .clone()
            .unwrap_or_else(|| config.judge_model.clone());
        let worker = worker_model.unwrap_or(&config.default_model).to_string();
        let client = ModelClient::new(transport, worker, judge_model);
        let policy = args
            .on_judge_error
            .map(JudgeFailurePolicy::from)
            .unwrap_or(config.on_judge_error);

        tracing::debug!(
            provider = client.provider_name(),
            worker_model = client.worker_model(),
            judge_model = client.judge_model(),
            policy = ?policy,
            "run context ready"
        );

        Ok(Self {
            config,
            prompts: Arc::new(prompts),
            client,
            policy,
        })
    }

    /// Reads a dataset, trying `datasets_dir` when the path does not exist as given.
    pub fn load_dataset(&self, path: &Path) -> anyhow::Result<(PathBuf, Vec<Record>)> {
        let resolved = self.resolve_dataset(path);
        let records = dataset::load_jsonl(&resolved)
            .with_context(|| format!("failed to load dataset {}", resolved.display()))?;
        Ok((resolved, records))
    }

    fn resolve_dataset(&self, path: &Path) -> PathBuf {
        if path.exists() || path.is_absolute() {
            return path.to_path_buf();
        }
        let candidate = self.config.datasets_dir.join(path);
        if candidate.exists() {
            candidate
        } else {
            path.to_path_buf()
        }
    }

    /// The batch task for `action`, or the one named by the dataset file.
    pub fn task(
        &self,
        action: Option<Action>,
        dataset: &Path,
        tones: &[String],
    ) -> anyhow::Result<EditTask> {
        let action = match action {
            Some(a) => a,
            None => infer_action(dataset).with_context(|| {
                format!(
                    "cannot infer the action from {}; pass --action lengthen|shorten|tone",
                    dataset.display()
                )
            })?,
        };
        Ok(match action {
            Action::Lengthen => EditTask::Lengthen,
            Action::Shorten => EditTask::Shorten,
            Action::Tone if tones.is_empty() => self.config.tone_task(),
            Action::Tone => EditTask::change_tone(tones.iter().cloned()),
        })
    }
}

fn build_transport(args: &ProviderArgs, config: &AppConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    match args.provider.as_str() {
        "openai" => {
            let key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("provider openai selected but OPENAI_API_KEY is not set"))?;
            let mut client = OpenAIClient::new(key);
            if let Some(base) = args.api_base.as_ref().or(config.api_base.as_ref()) {
                client = client.with_api_base(base.clone());
            }
            if let Some(secs) = args.timeout_secs.or(config.request_timeout_secs) {
                if secs == 0 {
                    bail!("--timeout-secs must be greater than zero");
                }
                client = client.with_timeout(Duration::from_secs(secs));
            }
            Ok(Arc::new(client))
        }
        "fake" => Ok(Arc::new(FakeClient::offline())),
        other => bail!("unknown provider: {} (expected openai or fake)", other),
    }
}

/// `lengthen.jsonl` -> Lengthen, `shorten.jsonl` -> Shorten, `tone.jsonl` -> Tone.
pub fn infer_action(dataset: &Path) -> Option<Action> {
    let stem = dataset.file_stem()?.to_str()?.to_ascii_lowercase();
    match stem.as_str() {
        "lengthen" => Some(Action::Lengthen),
        "shorten" => Some(Action::Shorten),
        "tone" | "change_tone" => Some(Action::Tone),
        _ => None,
    }
}
