// src/core/search.rs — Budget-bounded reflective search loop

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::reflection::{AcceptancePolicy, GreedyAccept, Reflector};
use super::state::{CallBudget, SearchState};
use super::tracker::BestTracker;
use super::types::*;
use crate::infra::config::SearchConfig;
use crate::infra::errors::PromptTuneError;
use crate::provider::roles::{BackendRole, BackendRoles};
use crate::provider::{ChatRequest, Message};
use crate::scoring::ComplianceScorer;

/// Real-time progress events, for the CLI layer to render.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Evaluated {
        example: usize,
        score: f32,
        best: f32,
    },
    Reflected {
        ordinal: u32,
    },
    Complete {
        calls_used: u32,
        calls_budget: u32,
        best_score: f32,
    },
}

/// Drives the EVALUATE/REFLECT cycle over a training set under a hard call
/// budget, tracking the best instruction found.
///
/// `run()` never fails: any error that escapes the cycle falls back to the
/// seed instruction with a warning diagnostic.
pub struct ReflectiveSearch {
    generator: BackendRole,
    scorer: ComplianceScorer,
    reflector: Reflector,
    policy: Box<dyn AcceptancePolicy>,
    tracker: Arc<BestTracker>,
    config: SearchConfig,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl ReflectiveSearch {
    pub fn new(
        roles: &BackendRoles,
        scorer: ComplianceScorer,
        tracker: Arc<BestTracker>,
        config: SearchConfig,
    ) -> Self {
        Self {
            generator: roles.execution.clone(),
            scorer,
            reflector: Reflector::new(roles.reflection.clone()),
            policy: Box::new(GreedyAccept),
            tracker,
            config,
            on_progress: None,
        }
    }

    /// Swap the acceptance policy. Greedy accept-always is the default.
    pub fn with_policy(mut self, policy: Box<dyn AcceptancePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run one optimization. The outer boundary: whatever happens inside,
    /// the caller gets a usable outcome, never an error.
    pub async fn run(&mut self, seed: &str, examples: &ExampleSet) -> RunOutcome {
        match self.try_run(seed, examples).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Optimization failed, falling back to seed");
                RunOutcome {
                    best_instruction: seed.to_string(),
                    best_score: 0.0,
                    origin: CandidateOrigin::Seed,
                    calls_used: 0,
                    evaluations: 0,
                    warning: Some(format!("optimization aborted: {e}")),
                }
            }
        }
    }

    async fn try_run(
        &mut self,
        seed: &str,
        examples: &ExampleSet,
    ) -> Result<RunOutcome, PromptTuneError> {
        let mut state = SearchState::new(Candidate::seed(seed), self.config.calls_budget);
        let mut trace: Vec<TraceEntry> = Vec::new();
        let mut evaluations = 0usize;

        let batch_size = self.config.reflect_every.max(1);
        let batches: Vec<&[Example]> = examples.train.chunks(batch_size).collect();
        let last_batch = batches.len().saturating_sub(1);

        for (batch_idx, batch) in batches.into_iter().enumerate() {
            if state.budget.exhausted() {
                break;
            }

            // EVALUATE
            let results = self
                .evaluate_batch(&state.current, batch, &state.budget)
                .await;
            for (example_idx, result) in results {
                evaluations += 1;
                self.offer_best(&state, &result);
                self.emit(ProgressEvent::Evaluated {
                    example: batch_idx * batch_size + example_idx,
                    score: result.score,
                    best: state.best.best_score().unwrap_or(0.0),
                });
                trace.push(TraceEntry {
                    instruction: state.current.instruction.clone(),
                    task_input: batch[example_idx].task_input.clone(),
                    output_text: result.output_text,
                    judged_flags: result.judged_flags,
                    score: result.score,
                });
            }

            // CHECK_BUDGET; no reflection after the final batch either, with
            // nothing left to evaluate a proposal against.
            if batch_idx == last_batch || trace.is_empty() {
                continue;
            }
            if !state.budget.try_reserve(1) {
                break;
            }

            // REFLECT
            match self.reflector.propose(&trace).await {
                Ok(proposed) => {
                    if self.policy.accept(&trace, &proposed) {
                        let ordinal = state.take_ordinal();
                        tracing::info!(ordinal, "Adopting reflected instruction");
                        state.current = Candidate::reflected(proposed, ordinal);
                        trace.clear();
                        self.emit(ProgressEvent::Reflected { ordinal });
                    }
                }
                Err(e) if e.is_transient_call_failure() => {
                    tracing::warn!(error = %e, "Reflection failed, keeping current instruction");
                }
                Err(e) => return Err(e),
            }
        }

        // Validation examples score the current candidate but never feed the
        // reflection trace.
        for example in &examples.validation {
            if state.budget.exhausted() {
                break;
            }
            if let Some(result) = self
                .evaluate_one(&state.current, example, &state.budget)
                .await
            {
                evaluations += 1;
                self.offer_best(&state, &result);
            }
        }

        // DONE
        let (best_instruction, best_score, origin) = match state.best.get() {
            Some((candidate, score)) => (candidate.instruction, score, candidate.origin),
            None => (seed.to_string(), 0.0, CandidateOrigin::Seed),
        };
        let calls_used = state.budget.used();

        self.emit(ProgressEvent::Complete {
            calls_used,
            calls_budget: state.budget.budget(),
            best_score,
        });
        tracing::info!(best_score, calls_used, evaluations, "Search complete");

        Ok(RunOutcome {
            best_instruction,
            best_score,
            origin,
            calls_used,
            evaluations,
            warning: None,
        })
    }

    /// Compare-and-set into the run-local best slot; on improvement, hand
    /// the candidate to the durable tracker as well.
    fn offer_best(&self, state: &SearchState, result: &EvaluationResult) {
        if !state.best.offer(&state.current, result.score) {
            return;
        }
        let diagnostics = Diagnostics {
            word_count: crate::scoring::structure::word_count(&result.output_text),
            affirmative_count: result.affirmative_count,
            candidate_ordinal: state.current.created_at,
        };
        if let Err(e) = self
            .tracker
            .record_if_better(&state.current, result.score, &diagnostics)
        {
            // Persistence trouble degrades durability, not the run itself.
            tracing::warn!(error = %e, "Failed to persist best record");
        }
    }

    /// Evaluate a batch with bounded concurrency. Results come back tagged
    /// with their index in the batch, in index order.
    async fn evaluate_batch(
        &self,
        candidate: &Candidate,
        batch: &[Example],
        budget: &CallBudget,
    ) -> Vec<(usize, EvaluationResult)> {
        let parallelism = self.config.parallelism.max(1);

        let mut results: Vec<(usize, EvaluationResult)> = stream::iter(batch.iter().enumerate())
            .map(move |(idx, example)| async move {
                self.evaluate_one(candidate, example, budget)
                    .await
                    .map(|r| (idx, r))
            })
            .buffer_unordered(parallelism)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);
        results
    }

    /// One generator call plus one scoring pass. Reserves two budget units
    /// up front (generator + judge) and refunds whatever the scorer did not
    /// consume; returns None when the budget cannot cover a full evaluation.
    async fn evaluate_one(
        &self,
        candidate: &Candidate,
        example: &Example,
        budget: &CallBudget,
    ) -> Option<EvaluationResult> {
        if !budget.try_reserve(2) {
            return None;
        }

        let request = ChatRequest {
            model: self.generator.model.clone(),
            messages: vec![Message::user(example.task_input.clone())],
            max_tokens: Some(self.generator.max_tokens),
            temperature: Some(self.generator.temperature),
            system: Some(candidate.instruction.clone()),
            timeout: Some(self.generator.timeout),
        };

        let output = match self.generator.backend.chat(request).await {
            Ok(resp) => resp.content,
            Err(e) if e.is_transient_call_failure() => {
                tracing::warn!(error = %e, "Generator call failed, scoring 0.0");
                budget.refund(1); // judge never runs for a failed generation
                return Some(EvaluationResult::zero(""));
            }
            Err(e) => {
                tracing::error!(error = %e, "Generator call failed unrecoverably");
                budget.refund(1);
                return Some(EvaluationResult::zero(""));
            }
        };

        match self.scorer.score(&output).await {
            Ok(outcome) => {
                budget.refund(1u32.saturating_sub(outcome.judge_calls));
                Some(outcome.result)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Scoring failed, scoring 0.0");
                budget.refund(1);
                Some(EvaluationResult::zero(output))
            }
        }
    }
}
