pub mod fake;
pub mod openai;

use crate::errors::ServiceError;
use crate::model::{CompletionRequest, LlmResponse};
use async_trait::async_trait;

/// Transport to a chat-completion service. One call is one request; no retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, ServiceError>;

    fn provider_name(&self) -> &'static str;
}
