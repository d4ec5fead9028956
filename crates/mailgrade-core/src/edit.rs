use crate::client::ModelClient;
use crate::errors::EvalError;
use crate::model::{ChatMessage, Instruction};
use crate::prompts::{PromptCatalog, PromptVariant};
use std::sync::Arc;

/// Substituted for an empty email body before rendering.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "Hello World!";

/// Applies one instruction to an email with the worker model.
#[derive(Clone)]
pub struct EditOperation {
    prompts: Arc<PromptCatalog>,
    client: ModelClient,
}

impl EditOperation {
    pub fn new(prompts: Arc<PromptCatalog>, client: ModelClient) -> Self {
        Self { prompts, client }
    }

    /// Returns the worker's reply verbatim.
    pub async fn apply(&self, instruction: &Instruction, text: &str) -> Result<String, EvalError> {
        let text = if text.is_empty() {
            EMPTY_TEXT_PLACEHOLDER
        } else {
            text
        };

        let mut args = vec![("selected_text", text)];
        match instruction {
            Instruction::Lengthen | Instruction::Shorten => {}
            Instruction::ChangeTone(tone) => {
                if tone.trim().is_empty() {
                    return Err(EvalError::InvalidRequest(
                        "change_tone requires a tone".into(),
                    ));
                }
                args.push(("tone", tone.as_str()));
            }
        }

        let name = instruction.prompt_name();
        let system = self.prompts.render(name, PromptVariant::System, &args)?;
        let user = self.prompts.render(name, PromptVariant::User, &args)?;

        tracing::trace!(instruction = %instruction, model = self.client.worker_model(), "rendering edit");
        self.client
            .complete(vec![ChatMessage::system(system), ChatMessage::user(user)], false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelRole, Role};
    use crate::providers::llm::fake::FakeClient;

    fn catalog() -> Arc<PromptCatalog> {
        Arc::new(
            PromptCatalog::from_yaml_str(
                r#"
lengthen:
  system: "lengthen-sys"
  user: "L: {selected_text}"
shorten:
  system: "shorten-sys"
  user: "S: {selected_text}"
change_tone:
  system: "tone-sys {tone}"
  user: "T({tone}): {selected_text}"
"#,
            )
            .unwrap(),
        )
    }

    fn op(fake: &FakeClient) -> EditOperation {
        EditOperation::new(
            catalog(),
            ModelClient::new(Arc::new(fake.clone()), "worker", "judge"),
        )
    }

    #[tokio::test]
    async fn renders_pair_and_returns_reply_verbatim() {
        let fake = FakeClient::with_replies("  Hi there, how are you?\n", "unused");
        let edited = op(&fake).apply(&Instruction::Lengthen, "Hi").await.unwrap();
        assert_eq!(edited, "  Hi there, how are you?\n");

        let sent = fake.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].role, ModelRole::Worker);
        assert_eq!(sent[0].model, "worker");
        assert_eq!(sent[0].messages[0].role, Role::System);
        assert_eq!(sent[0].messages[0].content, "lengthen-sys");
        assert_eq!(sent[0].messages[1].role, Role::User);
        assert_eq!(sent[0].messages[1].content, "L: Hi");
    }

    #[tokio::test]
    async fn tone_is_substituted_in_both_variants() {
        let fake = FakeClient::with_replies("ok", "unused");
        op(&fake)
            .apply(&Instruction::ChangeTone("friendly".into()), "Send it")
            .await
            .unwrap();
        let sent = &fake.requests()[0];
        assert_eq!(sent.messages[0].content, "tone-sys friendly");
        assert_eq!(sent.messages[1].content, "T(friendly): Send it");
    }

    #[tokio::test]
    async fn empty_text_uses_placeholder() {
        let fake = FakeClient::with_replies("ok", "unused");
        op(&fake).apply(&Instruction::Shorten, "").await.unwrap();
        assert_eq!(fake.requests()[0].messages[1].content, "S: Hello World!");
    }

    #[tokio::test]
    async fn blank_tone_is_rejected_without_a_call() {
        let fake = FakeClient::with_replies("ok", "unused");
        let err = op(&fake)
            .apply(&Instruction::ChangeTone(String::new()), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidRequest(_)));
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_template_fails_before_calling() {
        let fake = FakeClient::with_replies("ok", "unused");
        let catalog = Arc::new(
            PromptCatalog::from_yaml_str("shorten:\n  user: \"{selected_text}\"\n").unwrap(),
        );
        let op = EditOperation::new(
            catalog,
            ModelClient::new(Arc::new(fake.clone()), "worker", "judge"),
        );
        let err = op.apply(&Instruction::Shorten, "x").await.unwrap_err();
        assert!(matches!(err, EvalError::TemplateNotFound { .. }));
        assert!(fake.requests().is_empty());
    }
}
