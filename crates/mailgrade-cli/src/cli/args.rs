use clap::{ArgAction, Parser, Subcommand};
use mailgrade_core::JudgeFailurePolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mailgrade",
    version,
    about = "Edit emails with an LLM and score the edits with an LLM judge"
)]
pub struct Cli {
    /// More log output on stderr (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Edit one email from a dataset and show both judge ratings
    Edit(EditArgs),
    /// Edit every email in a dataset and report average scores
    Generate(GenerateArgs),
    /// Run the same dataset through several models and compare their scores
    Compare(CompareArgs),
    Version,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Lengthen,
    Shorten,
    Tone,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnJudgeError {
    /// Stop the run and keep the results gathered so far
    Abort,
    /// Rate the unparseable axis 0 and continue
    ScoreZero,
}

impl From<OnJudgeError> for JudgeFailurePolicy {
    fn from(v: OnJudgeError) -> Self {
        match v {
            OnJudgeError::Abort => JudgeFailurePolicy::Abort,
            OnJudgeError::ScoreZero => JudgeFailurePolicy::ScoreZero,
        }
    }
}

/// Provider and config flags shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Config file (default: mailgrade.yaml in the working directory, when present)
    #[arg(long, env = "MAILGRADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Completion provider
    /// - openai: OpenAI-compatible chat completions (needs OPENAI_API_KEY)
    /// - fake: offline responses for demos and tests
    #[arg(long, default_value = "openai", env = "MAILGRADE_PROVIDER")]
    pub provider: String,

    /// Judge model; fixed for every worker model in a run
    #[arg(long, env = "MAILGRADE_JUDGE_MODEL")]
    pub judge_model: Option<String>,

    /// Base URL of the completion API
    #[arg(long, env = "OPENAI_API_BASE")]
    pub api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Prompt YAML overriding the config and the built-in prompts
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// What to do when the judge reply cannot be parsed
    #[arg(long, value_enum)]
    pub on_judge_error: Option<OnJudgeError>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EditArgs {
    /// JSONL dataset (looked up in datasets_dir when not found as given)
    #[arg(long)]
    pub dataset: PathBuf,

    /// Record id to edit
    #[arg(long)]
    pub id: String,

    #[arg(long, value_enum)]
    pub action: Action,

    /// Tone for --action tone
    #[arg(long, default_value = "friendly")]
    pub tone: String,

    /// Worker model (default: config default_model)
    #[arg(long)]
    pub model: Option<String>,

    /// Replace the email body before editing
    #[arg(long)]
    pub text: Option<String>,

    /// Print the result as JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long)]
    pub dataset: PathBuf,

    /// Defaults to the dataset file name (lengthen.jsonl, shorten.jsonl, tone.jsonl)
    #[arg(long, value_enum)]
    pub action: Option<Action>,

    /// Tones for --action tone (default: config tones)
    #[arg(long, value_delimiter = ',')]
    pub tones: Vec<String>,

    /// Worker model (default: config default_model)
    #[arg(long)]
    pub model: Option<String>,

    /// Write the report as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Only print the summary, not every edit
    #[arg(long)]
    pub summary_only: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long, value_enum)]
    pub action: Option<Action>,

    #[arg(long, value_delimiter = ',')]
    pub tones: Vec<String>,

    /// Worker models to compare, in run order (default: config models)
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Write the comparison as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}
