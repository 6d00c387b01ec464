// src/scoring/mod.rs — Compliance scoring against the criteria checklist

pub mod parser;
pub mod structure;

use crate::core::types::{Criterion, EvaluationResult};
use crate::infra::config::ScoringConfig;
use crate::infra::errors::PromptTuneError;
use crate::provider::roles::BackendRole;
use crate::provider::{ChatRequest, Message};

/// What one scoring pass produced, plus how many budget-consuming judge
/// calls it made (0 when the short-circuit fired).
pub struct ScoreOutcome {
    pub result: EvaluationResult,
    pub judge_calls: u32,
}

/// Turns generated text into a score in [0, 1].
///
/// Pure apart from the single judge call: reads nothing but its inputs and
/// writes nothing. Search state stays with the search loop.
pub struct ComplianceScorer {
    judge: BackendRole,
    criteria: Vec<Criterion>,
    config: ScoringConfig,
}

impl ComplianceScorer {
    pub fn new(judge: BackendRole, criteria: Vec<Criterion>, config: ScoringConfig) -> Self {
        Self {
            judge,
            criteria,
            config,
        }
    }

    /// The fixed checklist description sent to the judge.
    pub fn criteria_description(&self) -> String {
        let mut out = String::from(
            "Bewerte den Text basierend auf folgenden Fragen. \
             Antworte für jede Frage strikt nur mit 'Ja' oder 'Nein'.\n\nFragen:\n",
        );
        for (i, c) in self.criteria.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, c.question));
        }
        out
    }

    /// Score one output. Degenerate output short-circuits to 0.0 without a
    /// judge call; a failed judge call degrades to 0.0 for this evaluation
    /// rather than aborting the run.
    pub async fn score(&self, output_text: &str) -> Result<ScoreOutcome, PromptTuneError> {
        if output_text.trim().is_empty()
            || output_text.chars().count() < self.config.min_output_length
        {
            tracing::debug!(
                len = output_text.len(),
                min = self.config.min_output_length,
                "Output below minimum length, skipping judge",
            );
            return Ok(ScoreOutcome {
                result: EvaluationResult::zero(output_text),
                judge_calls: 0,
            });
        }

        let request = ChatRequest {
            model: self.judge.model.clone(),
            messages: vec![Message::user(output_text)],
            max_tokens: Some(self.judge.max_tokens),
            temperature: Some(self.judge.temperature),
            system: Some(self.criteria_description()),
            timeout: Some(self.judge.timeout),
        };

        let assessment = match self.judge.backend.chat(request).await {
            Ok(resp) => resp.content,
            Err(e) if e.is_transient_call_failure() => {
                tracing::warn!(error = %e, "Judge call failed, scoring 0.0");
                return Ok(ScoreOutcome {
                    result: EvaluationResult::zero(output_text),
                    judge_calls: 1,
                });
            }
            Err(e) => return Err(e),
        };

        Ok(ScoreOutcome {
            result: self.score_assessment(output_text, &assessment),
            judge_calls: 1,
        })
    }

    /// Deterministic part of the metric: tolerant counting plus structural
    /// modifiers. Split out so tests can cover it without a backend.
    pub fn score_assessment(&self, output_text: &str, assessment: &str) -> EvaluationResult {
        let token = &self.config.affirmative_token;
        let count = parser::count_affirmative(assessment, token).min(self.criteria.len());
        let raw = count as f32 / self.criteria.len().max(1) as f32;

        let words = structure::word_count(output_text);
        let length_mod = structure::length_modifier(words, &self.config);
        let paragraph_mod = structure::paragraph_modifier(output_text, &self.config);
        let structural = length_mod * paragraph_mod;

        let score = (raw * structural).clamp(0.0, 1.0);

        tracing::debug!(
            affirmative = count,
            criteria = self.criteria.len(),
            words,
            length_mod,
            paragraph_mod,
            score,
            "Scored output",
        );

        EvaluationResult {
            output_text: output_text.to_string(),
            judged_flags: parser::judged_flags(assessment, token),
            affirmative_count: count,
            structural_score: structural,
            score,
        }
    }
}
