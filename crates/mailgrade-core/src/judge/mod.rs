//! Judge calls for the two evaluation axes.

mod parse;

pub use parse::parse_rating;

use crate::client::ModelClient;
use crate::errors::EvalError;
use crate::model::{ChatMessage, Rating};
use crate::prompts::{PromptCatalog, PromptVariant};
use std::sync::Arc;

pub const FAITHFULNESS_PROMPT: &str = "faithfulness_judge";
pub const COMPLETENESS_PROMPT: &str = "completeness_judge";

/// Scores edits with the judge model. Unparseable output is returned as
/// [`EvalError::JudgeParse`]; defaulting is the caller's decision.
#[derive(Clone)]
pub struct JudgeOperation {
    prompts: Arc<PromptCatalog>,
    client: ModelClient,
}

impl JudgeOperation {
    pub fn new(prompts: Arc<PromptCatalog>, client: ModelClient) -> Self {
        Self { prompts, client }
    }

    /// Did the edit keep the original meaning?
    pub async fn judge_faithfulness(
        &self,
        original_text: &str,
        edited_text: &str,
    ) -> Result<Rating, EvalError> {
        let args = [
            ("selected_text", original_text),
            ("model_response", edited_text),
        ];
        self.call(FAITHFULNESS_PROMPT, &args).await
    }

    /// Did the edit carry out `instruction` (an instruction tag)?
    pub async fn judge_completeness(
        &self,
        instruction: &str,
        original_text: &str,
        edited_text: &str,
    ) -> Result<Rating, EvalError> {
        let args = [
            ("instruction", instruction),
            ("selected_text", original_text),
            ("model_response", edited_text),
        ];
        self.call(COMPLETENESS_PROMPT, &args).await
    }

    async fn call(&self, name: &str, args: &[(&str, &str)]) -> Result<Rating, EvalError> {
        let system = self.prompts.render(name, PromptVariant::System, args)?;
        let user = self.prompts.render(name, PromptVariant::User, args)?;
        let raw = self
            .client
            .complete(vec![ChatMessage::system(system), ChatMessage::user(user)], true)
            .await?;

        let parsed = parse_rating(&raw);
        if let Err(e) = &parsed {
            tracing::debug!(prompt = name, judge_model = self.client.judge_model(), error = %e, "judge output rejected");
        }
        parsed
    }
}
