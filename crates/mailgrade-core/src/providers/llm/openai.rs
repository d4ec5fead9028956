use super::LlmClient;
use crate::errors::ServiceError;
use crate::model::{CompletionRequest, LlmResponse};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAIClient {
    pub api_base: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
    pub client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key,
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// Pulls `choices[0].message.content` out of a chat completion body.
pub(crate) fn extract_completion_text(body: &serde_json::Value) -> Result<String, String> {
    let choices = body
        .get("choices")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "response has no 'choices' array".to_string())?;
    let first = choices
        .first()
        .ok_or_else(|| "response returned no choices".to_string())?;
    first
        .pointer("/message/content")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| "first choice has no message content".to_string())
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, ServiceError> {
        let model = request.model.as_str();
        let body = json!({
            "model": model,
            "messages": request.messages,
            "temperature": request.temperature,
        });

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| transport_error(model, e))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_else(|_| String::new());
            return Err(ServiceError::new(
                PROVIDER,
                model,
                format!("chat API error: {}", error_text),
            )
            .with_status(status.as_u16()));
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| transport_error(model, e))?;
        let text = extract_completion_text(&json)
            .map_err(|detail| ServiceError::new(PROVIDER, model, detail))?;

        Ok(LlmResponse {
            text,
            provider: PROVIDER.to_string(),
            model: json
                .get("model")
                .and_then(|v| v.as_str())
                .unwrap_or(model)
                .to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

fn transport_error(model: &str, e: reqwest::Error) -> ServiceError {
    let detail = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        e.to_string()
    };
    let err = ServiceError::new(PROVIDER, model, detail);
    match e.status() {
        Some(status) => err.with_status(status.as_u16()),
        None => err,
    }
}
