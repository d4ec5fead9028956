use crate::report::AggregateReport;
use std::fmt;

/// Failure of a single request to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub provider: String,
    pub model: String,
    pub status: Option<u16>,
    pub detail: String,
}

impl ServiceError {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            status: None,
            detail: detail.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} request for model '{}' failed", self.provider, self.model)?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        write!(f, ": {}", self.detail)
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("prompt template not found: {name}.{variant}")]
    TemplateNotFound { name: String, variant: String },

    #[error("prompt template {name}.{variant} has no argument for placeholder '{placeholder}'")]
    TemplateArgument {
        name: String,
        variant: String,
        placeholder: String,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("judge response could not be parsed ({reason}): {raw:?}")]
    JudgeParse { raw: String, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("run cancelled")]
    Cancelled,
}

impl EvalError {
    pub fn judge_parse(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::JudgeParse {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Raw judge text, when the error came from an unparseable judge response.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::JudgeParse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// A batch run that stopped early. Carries everything produced before the
/// failure so the caller can still report on it.
#[derive(Debug, Clone)]
pub struct BatchRunError {
    pub record_id: Option<String>,
    pub instruction: Option<String>,
    pub source: EvalError,
    pub partial: AggregateReport,
}

impl BatchRunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, EvalError::Cancelled)
    }
}

impl fmt::Display for BatchRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run for model '{}' stopped", self.partial.model)?;
        match (&self.record_id, &self.instruction) {
            (Some(id), Some(instruction)) => write!(f, " at record '{}' ({})", id, instruction)?,
            (Some(id), None) => write!(f, " at record '{}'", id)?,
            _ => {}
        }
        write!(
            f,
            " after {} result(s): {}",
            self.partial.results.len(),
            self.source
        )
    }
}

impl std::error::Error for BatchRunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display_includes_status() {
        let err = ServiceError::new("openai", "gpt-4.1", "rate limited").with_status(429);
        assert_eq!(
            err.to_string(),
            "openai request for model 'gpt-4.1' failed (status 429): rate limited"
        );
    }

    #[test]
    fn judge_parse_exposes_raw_text() {
        let err = EvalError::judge_parse("not json", "no JSON object");
        assert_eq!(err.raw_response(), Some("not json"));
        assert!(err.to_string().contains("not json"));
    }

    #[test]
    fn batch_error_names_record_and_instruction() {
        let err = BatchRunError {
            record_id: Some("7".into()),
            instruction: Some("shorten".into()),
            source: EvalError::judge_parse("??", "no JSON object"),
            partial: AggregateReport::from_results("gpt-4o-mini", Vec::new()),
        };
        let msg = err.to_string();
        assert!(msg.contains("gpt-4o-mini"));
        assert!(msg.contains("record '7' (shorten)"));
        assert!(msg.contains("after 0 result(s)"));
        assert!(!err.is_cancelled());
    }
}
