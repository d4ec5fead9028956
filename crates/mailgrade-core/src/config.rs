//! `mailgrade.yaml`: models, tones, prompt source and judge failure policy.

use crate::model::EditTask;
use crate::pipeline::JudgeFailurePolicy;
use crate::prompts::PromptCatalog;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "mailgrade.yaml";
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4.1";
pub const DEFAULT_WORKER_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML{}: {source}", .path.as_deref().map(|p| format!(" in {}", p)).unwrap_or_default())]
    Yaml {
        path: Option<String>,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("prompt {name}.{variant} is invalid: {detail}")]
    InvalidPrompt {
        name: String,
        variant: String,
        detail: String,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Yaml { source, .. } => Self::Yaml {
                path: Some(path.display().to_string()),
                source,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Model used for every judge call, identical across compared models.
    pub judge_model: String,
    /// Worker model for `edit` and `generate` when none is given.
    pub default_model: String,
    /// Worker models compared by `compare`, in run order.
    pub models: Vec<String>,
    /// Tones a `change_tone` batch fans out into.
    pub tones: Vec<String>,
    /// Prompt YAML; relative paths resolve against the config file's directory.
    pub prompts: Option<PathBuf>,
    pub datasets_dir: PathBuf,
    pub on_judge_error: JudgeFailurePolicy,
    pub request_timeout_secs: Option<u64>,
    pub api_base: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            judge_model: DEFAULT_JUDGE_MODEL.to_string(),
            default_model: DEFAULT_WORKER_MODEL.to_string(),
            models: vec![DEFAULT_WORKER_MODEL.to_string(), DEFAULT_JUDGE_MODEL.to_string()],
            tones: vec![
                "friendly".to_string(),
                "sympathetic".to_string(),
                "professional".to_string(),
            ],
            prompts: None,
            datasets_dir: PathBuf::from("datasets"),
            on_judge_error: JudgeFailurePolicy::default(),
            request_timeout_secs: None,
            api_base: None,
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml { path: None, source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads a config file; relative `prompts`/`datasets_dir` are anchored at
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut cfg = Self::from_yaml_str(&raw).map_err(|e| e.with_path(path))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(p) = cfg.prompts.take() {
            cfg.prompts = Some(anchor(base, p));
        }
        cfg.datasets_dir = anchor(base, std::mem::take(&mut cfg.datasets_dir));
        Ok(cfg)
    }

    /// Loads `path` if given, else `mailgrade.yaml` in the working directory
    /// when present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.judge_model.trim().is_empty() {
            return Err(ConfigError::Invalid("judge_model must not be empty".into()));
        }
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::Invalid("default_model must not be empty".into()));
        }
        if self.tones.is_empty() {
            return Err(ConfigError::Invalid("tones must list at least one tone".into()));
        }
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid("models must not contain empty names".into()));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The configured prompt file, or the built-in catalog.
    pub fn prompt_catalog(&self) -> Result<PromptCatalog, ConfigError> {
        match &self.prompts {
            Some(path) => PromptCatalog::from_path(path),
            None => PromptCatalog::builtin(),
        }
    }

    /// Tone task over the configured tones.
    pub fn tone_task(&self) -> EditTask {
        EditTask::change_tone(self.tones.iter().cloned())
    }
}

fn anchor(base: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_openai_models() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.judge_model, "gpt-4.1");
        assert_eq!(cfg.models, vec!["gpt-4o-mini", "gpt-4.1"]);
        assert_eq!(cfg.on_judge_error, JudgeFailurePolicy::Abort);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = AppConfig::from_yaml_str("judge_model: judge-x\non_judge_error: score_zero\n")
            .unwrap();
        assert_eq!(cfg.judge_model, "judge-x");
        assert_eq!(cfg.default_model, "gpt-4o-mini");
        assert_eq!(cfg.on_judge_error, JudgeFailurePolicy::ScoreZero);
        assert_eq!(cfg.tones.len(), 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_yaml_str("judge_modle: typo\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn empty_tones_are_rejected() {
        let err = AppConfig::from_yaml_str("tones: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("prompts.yaml"),
            "shorten:\n  user: \"{selected_text}\"\n",
        )
        .unwrap();
        let cfg_path = dir.path().join("mailgrade.yaml");
        std::fs::write(&cfg_path, "prompts: prompts.yaml\ndatasets_dir: data\n").unwrap();

        let cfg = AppConfig::load(&cfg_path).unwrap();
        assert_eq!(cfg.prompts.as_deref(), Some(dir.path().join("prompts.yaml").as_path()));
        assert_eq!(cfg.datasets_dir, dir.path().join("data"));

        let catalog = cfg.prompt_catalog().unwrap();
        assert!(catalog.contains("shorten", crate::prompts::PromptVariant::User));
    }

    #[test]
    fn yaml_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("mailgrade.yaml");
        std::fs::write(&cfg_path, "tones: [unclosed\n").unwrap();
        let msg = AppConfig::load(&cfg_path).unwrap_err().to_string();
        assert!(msg.contains("mailgrade.yaml"), "{msg}");
    }
}
