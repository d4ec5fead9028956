use crate::errors::EvalError;
use crate::model::{ChatMessage, CompletionRequest, ModelRole};
use crate::providers::llm::LlmClient;
use std::sync::Arc;
use std::time::Instant;

/// Sampling temperature for every call. Judge output is parsed, so repeated
/// calls must give the same answer.
pub const TEMPERATURE: f32 = 0.0;

/// Binds a transport to a worker model and the fixed judge model.
#[derive(Clone)]
pub struct ModelClient {
    transport: Arc<dyn LlmClient>,
    worker_model: String,
    judge_model: String,
}

impl ModelClient {
    pub fn new(
        transport: Arc<dyn LlmClient>,
        worker_model: impl Into<String>,
        judge_model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            worker_model: worker_model.into(),
            judge_model: judge_model.into(),
        }
    }

    /// Same transport and judge, different worker.
    pub fn with_worker_model(&self, worker_model: impl Into<String>) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            worker_model: worker_model.into(),
            judge_model: self.judge_model.clone(),
        }
    }

    pub fn worker_model(&self) -> &str {
        &self.worker_model
    }

    pub fn judge_model(&self) -> &str {
        &self.judge_model
    }

    pub fn provider_name(&self) -> &'static str {
        self.transport.provider_name()
    }

    /// Sends one request and returns the text of the first choice.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        use_judge_model: bool,
    ) -> Result<String, EvalError> {
        let (model, role) = if use_judge_model {
            (self.judge_model.as_str(), ModelRole::Judge)
        } else {
            (self.worker_model.as_str(), ModelRole::Worker)
        };
        let request = CompletionRequest {
            model: model.to_string(),
            messages,
            temperature: TEMPERATURE,
            role,
        };

        let start = Instant::now();
        let result = self.transport.complete(&request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                tracing::debug!(
                    provider = self.transport.provider_name(),
                    model = %model,
                    judge = use_judge_model,
                    elapsed_ms,
                    response_len = resp.text.len(),
                    "completion finished"
                );
                Ok(resp.text)
            }
            Err(e) => {
                tracing::debug!(
                    provider = self.transport.provider_name(),
                    model = %model,
                    judge = use_judge_model,
                    elapsed_ms,
                    error = %e,
                    "completion failed"
                );
                Err(EvalError::Service(e))
            }
        }
    }
}
