use super::LlmClient;
use crate::errors::ServiceError;
use crate::model::{CompletionRequest, LlmResponse, ModelRole, Role};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Responder = dyn Fn(&CompletionRequest) -> Result<String, ServiceError> + Send + Sync;

/// In-process stand-in for a completion service. Answers from a closure, a
/// queue of scripted replies, or the offline defaults, and records every
/// request it receives.
#[derive(Clone)]
pub struct FakeClient {
    responder: Arc<Responder>,
    script: Arc<Mutex<VecDeque<Result<String, ServiceError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Option<Duration>,
}

impl FakeClient {
    /// Offline defaults: worker calls echo the email body with a marker,
    /// judge calls return a passing rating.
    pub fn offline() -> Self {
        Self::from_fn(|req| {
            Ok(match req.role {
                ModelRole::Judge => {
                    r#"{"rating": 3, "reasoning": "offline judge: edit accepted"}"#.to_string()
                }
                ModelRole::Worker => {
                    let user = req
                        .messages
                        .iter()
                        .rev()
                        .find(|m| m.role == Role::User)
                        .map(|m| m.content.as_str())
                        .unwrap_or("");
                    format!("[{} edit]\n{}", req.model, user.trim())
                }
            })
        })
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, ServiceError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(f),
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Separate fixed replies for worker and judge calls.
    pub fn with_replies(worker: impl Into<String>, judge: impl Into<String>) -> Self {
        let worker = worker.into();
        let judge = judge.into();
        Self::from_fn(move |req| {
            Ok(match req.role {
                ModelRole::Worker => worker.clone(),
                ModelRole::Judge => judge.clone(),
            })
        })
    }

    /// Replies consumed in order before falling back to the responder.
    pub fn with_script<I>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ServiceError>>,
    {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(replies);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, ServiceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let scripted = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        let text = match scripted {
            Some(reply) => reply?,
            None => (self.responder)(request)?,
        };

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: request.model.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
