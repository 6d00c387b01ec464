// src/core/types.rs — Core data model for the search

use serde::{Deserialize, Serialize};

use crate::infra::config::CriterionConfig;

/// One fixed yes/no compliance question evaluated against generated text.
///
/// Criteria are ordered; the judge response is interpreted by counting
/// affirmative tokens, so the position in the list is what ties a flag back
/// to its question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub question: String,
}

impl From<&CriterionConfig> for Criterion {
    fn from(c: &CriterionConfig) -> Self {
        Self {
            question: c.question.clone(),
        }
    }
}

/// Where a candidate instruction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrigin {
    Seed,
    Reflected,
}

impl std::fmt::Display for CandidateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateOrigin::Seed => write!(f, "seed"),
            CandidateOrigin::Reflected => write!(f, "reflected"),
        }
    }
}

/// One version of the instruction text under evaluation. Immutable once
/// created; the search replaces its current candidate wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub instruction: String,
    pub origin: CandidateOrigin,
    /// Creation ordinal within the run (seed = 0).
    pub created_at: u32,
}

impl Candidate {
    pub fn seed(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            origin: CandidateOrigin::Seed,
            created_at: 0,
        }
    }

    pub fn reflected(instruction: impl Into<String>, created_at: u32) -> Self {
        Self {
            instruction: instruction.into(),
            origin: CandidateOrigin::Reflected,
            created_at,
        }
    }
}

/// A training or validation example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub task_input: String,
    #[serde(default)]
    pub reference_output: Option<String>,
}

/// Train/validation partition. The validation subset is scored but never
/// shown to the reflection step.
#[derive(Debug, Clone, Default)]
pub struct ExampleSet {
    pub train: Vec<Example>,
    pub validation: Vec<Example>,
}

impl ExampleSet {
    pub fn train_only(train: Vec<Example>) -> Self {
        Self {
            train,
            validation: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    /// Built-in demo task: two German story examples.
    pub fn builtin_demo() -> Self {
        Self::train_only(vec![
            Example {
                task_input: "Ein einsamer Wolf im Winter.".into(),
                reference_output: Some(
                    "### Der Wolf\n\nEr lief durch den Schnee.\n\nDer Wind war kalt.\n\nWo war er?"
                        .into(),
                ),
            },
            Example {
                task_input: "Ein altes Schiff auf dem Meer.".into(),
                reference_output: Some(
                    "### Das Schiff\n\nDie Wellen schlugen hoch.\n\nKeiner war an Bord.\n\nWer segelt hier?"
                        .into(),
                ),
            },
        ])
    }
}

/// Outcome of scoring one (candidate, example) pair. Never mutated after
/// creation.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub output_text: String,
    /// One flag per criterion as the judge answered them. May be shorter or
    /// longer than the criteria list when the judge misbehaves.
    pub judged_flags: Vec<bool>,
    /// Affirmative answers counted in the assessment, clamped to the number
    /// of criteria. This is the count the raw score was computed from.
    pub affirmative_count: usize,
    /// Product of the structural modifiers, before the judge ratio.
    pub structural_score: f32,
    /// Final score in [0, 1].
    pub score: f32,
}

impl EvaluationResult {
    /// Zero-score result for a failed or degenerate generation.
    pub fn zero(output_text: impl Into<String>) -> Self {
        Self {
            output_text: output_text.into(),
            judged_flags: Vec::new(),
            affirmative_count: 0,
            structural_score: 0.0,
            score: 0.0,
        }
    }
}

/// Structural diagnostics for the durable best record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub word_count: usize,
    pub affirmative_count: usize,
    pub candidate_ordinal: u32,
}

/// What a finished run hands back to the caller. Always usable: on total
/// failure it carries the seed instruction and a warning.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub best_instruction: String,
    pub best_score: f32,
    pub origin: CandidateOrigin,
    pub calls_used: u32,
    pub evaluations: usize,
    /// Set when the run aborted internally and fell back to the seed.
    pub warning: Option<String>,
}

/// Full trace of one evaluation, fed to the reflection step.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub instruction: String,
    pub task_input: String,
    pub output_text: String,
    pub judged_flags: Vec<bool>,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_candidate() {
        let c = Candidate::seed("Schreibe eine Geschichte.");
        assert_eq!(c.origin, CandidateOrigin::Seed);
        assert_eq!(c.created_at, 0);
    }

    #[test]
    fn test_reflected_candidate() {
        let c = Candidate::reflected("Schreibe eine bessere Geschichte.", 3);
        assert_eq!(c.origin, CandidateOrigin::Reflected);
        assert_eq!(c.created_at, 3);
    }

    #[test]
    fn test_zero_result() {
        let r = EvaluationResult::zero("");
        assert_eq!(r.score, 0.0);
        assert!(r.judged_flags.is_empty());
    }

    #[test]
    fn test_builtin_demo_has_train_examples() {
        let set = ExampleSet::builtin_demo();
        assert_eq!(set.train.len(), 2);
        assert!(set.validation.is_empty());
        assert!(!set.is_empty());
    }

    #[test]
    fn test_example_deserializes_without_reference() {
        let e: Example = serde_json::from_str(r#"{"task_input": "Eine Katze."}"#).unwrap();
        assert!(e.reference_output.is_none());
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(CandidateOrigin::Seed.to_string(), "seed");
        assert_eq!(CandidateOrigin::Reflected.to_string(), "reflected");
    }
}
