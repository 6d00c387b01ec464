// src/core/reflection.rs — Instruction proposals from evaluation traces

use crate::core::types::TraceEntry;
use crate::infra::errors::PromptTuneError;
use crate::provider::roles::BackendRole;
use crate::provider::{ChatRequest, Message};

/// Decides whether a freshly proposed instruction replaces the current one.
/// The documented search behavior is greedy hill-climbing over *current*;
/// this seam exists so stricter policies can be swapped in without touching
/// the loop.
pub trait AcceptancePolicy: Send + Sync {
    fn accept(&self, trace: &[TraceEntry], proposed: &str) -> bool;
}

/// Always adopt the proposal. `best` is protected separately, so a bad
/// proposal can waste budget but never regress the result.
pub struct GreedyAccept;

impl AcceptancePolicy for GreedyAccept {
    fn accept(&self, _trace: &[TraceEntry], _proposed: &str) -> bool {
        true
    }
}

/// Proposes a revised instruction from the accumulated trace of the current
/// candidate. One backend call per proposal; the loop charges the budget.
pub struct Reflector {
    role: BackendRole,
}

impl Reflector {
    pub fn new(role: BackendRole) -> Self {
        Self { role }
    }

    fn build_prompt(trace: &[TraceEntry]) -> String {
        let mut prompt = String::from(
            "You are improving an instruction for a text generator. Below are \
             recent attempts: the instruction used, the input, the generated \
             output, and the compliance score in [0, 1].\n\n",
        );

        for (i, entry) in trace.iter().enumerate() {
            prompt.push_str(&format!(
                "### Attempt {}\nInstruction: {}\nInput: {}\nOutput:\n{}\nScore: {:.3}\n",
                i + 1,
                entry.instruction,
                entry.task_input,
                entry.output_text,
                entry.score,
            ));
            if !entry.judged_flags.is_empty() {
                let flags: Vec<&str> = entry
                    .judged_flags
                    .iter()
                    .map(|f| if *f { "yes" } else { "no" })
                    .collect();
                prompt.push_str(&format!("Checklist answers: {}\n", flags.join(", ")));
            }
            prompt.push('\n');
        }

        prompt.push_str(
            "Propose a single improved instruction that raises the score. \
             Respond with the instruction text only, no preamble and no \
             quotation marks.",
        );
        prompt
    }

    pub async fn propose(&self, trace: &[TraceEntry]) -> Result<String, PromptTuneError> {
        let request = ChatRequest {
            model: self.role.model.clone(),
            messages: vec![Message::user(Self::build_prompt(trace))],
            max_tokens: Some(self.role.max_tokens),
            temperature: Some(self.role.temperature),
            system: None,
            timeout: Some(self.role.timeout),
        };

        let response = self.role.backend.chat(request).await?;
        let proposed = response.content.trim().to_string();

        if proposed.is_empty() {
            return Err(PromptTuneError::Backend {
                backend: self.role.backend.id().to_string(),
                message: "Reflection returned empty instruction".into(),
                retriable: true,
            });
        }
        Ok(proposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::roles::BackendRoles;
    use crate::provider::{ChatResponse, ModelBackend, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn trace() -> Vec<TraceEntry> {
        vec![TraceEntry {
            instruction: "Schreibe eine Geschichte.".into(),
            task_input: "Ein einsamer Wolf im Winter.".into(),
            output_text: "Der Wolf lief.".into(),
            judged_flags: vec![true, false, false, true],
            score: 0.25,
        }]
    }

    #[test]
    fn test_prompt_includes_trace_fields() {
        let prompt = Reflector::build_prompt(&trace());
        assert!(prompt.contains("Schreibe eine Geschichte."));
        assert!(prompt.contains("Ein einsamer Wolf im Winter."));
        assert!(prompt.contains("Score: 0.250"));
        assert!(prompt.contains("yes, no, no, yes"));
    }

    #[test]
    fn test_greedy_always_accepts() {
        let policy = GreedyAccept;
        assert!(policy.accept(&trace(), "anything"));
        assert!(policy.accept(&[], ""));
    }

    #[tokio::test]
    async fn test_propose_trims_response() {
        struct Canned;

        #[async_trait]
        impl ModelBackend for Canned {
            fn id(&self) -> &str {
                "canned"
            }
            async fn chat(&self, _r: ChatRequest) -> Result<ChatResponse, PromptTuneError> {
                Ok(ChatResponse {
                    content: "  Schreibe vier Absätze auf Deutsch.\n".into(),
                    usage: TokenUsage::default(),
                })
            }
        }

        let roles = BackendRoles::from_single(Arc::new(Canned), "m");
        let reflector = Reflector::new(roles.reflection);
        let proposed = reflector.propose(&trace()).await.unwrap();
        assert_eq!(proposed, "Schreibe vier Absätze auf Deutsch.");
    }

    #[tokio::test]
    async fn test_empty_proposal_is_an_error() {
        struct Empty;

        #[async_trait]
        impl ModelBackend for Empty {
            fn id(&self) -> &str {
                "empty"
            }
            async fn chat(&self, _r: ChatRequest) -> Result<ChatResponse, PromptTuneError> {
                Ok(ChatResponse {
                    content: "   ".into(),
                    usage: TokenUsage::default(),
                })
            }
        }

        let roles = BackendRoles::from_single(Arc::new(Empty), "m");
        let reflector = Reflector::new(roles.reflection);
        assert!(reflector.propose(&trace()).await.is_err());
    }
}
