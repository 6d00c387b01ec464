// src/core/tracker.rs — Durable best-candidate record

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::types::{Candidate, Diagnostics};
use crate::infra::errors::PromptTuneError;

/// Records the highest-scoring candidate seen, durably.
///
/// The record file is the only resource shared across runs: the persisted
/// score is loaded at construction, so a new run can never regress a best
/// that an earlier process already wrote. Writers serialize through the
/// internal mutex and the file is replaced by atomic rename, so a reader
/// never observes a torn record.
///
/// Knows nothing about generators or judges; it only receives text and
/// already-computed scores.
pub struct BestTracker {
    path: PathBuf,
    inner: Mutex<f32>,
}

/// One parsed record, independently readable without the rest of the system.
#[derive(Debug, Clone, PartialEq)]
pub struct BestRecord {
    pub score: f32,
    pub diagnostics: Diagnostics,
    pub origin: String,
    pub recorded_at: String,
    pub instruction: String,
}

const HEADER_SEPARATOR: &str = "---";

impl BestTracker {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let persisted = BestRecord::load(&path)
            .map(|r| r.score)
            .unwrap_or(f32::NEG_INFINITY);
        Self {
            path,
            inner: Mutex::new(persisted),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest score on record, if any run ever recorded one.
    pub fn best_score(&self) -> Option<f32> {
        let score = *self.inner.lock().expect("tracker poisoned");
        score.is_finite().then_some(score)
    }

    /// Persist the candidate iff its score beats everything recorded so far.
    /// Ties keep the incumbent. Returns true when a record was written.
    pub fn record_if_better(
        &self,
        candidate: &Candidate,
        score: f32,
        diagnostics: &Diagnostics,
    ) -> Result<bool, PromptTuneError> {
        let mut best = self.inner.lock().expect("tracker poisoned");
        if score <= *best {
            return Ok(false);
        }

        let record = BestRecord {
            score,
            diagnostics: diagnostics.clone(),
            origin: candidate.origin.to_string(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
            instruction: candidate.instruction.clone(),
        };
        self.write_atomic(&record)?;
        *best = score;

        tracing::info!(score, origin = %candidate.origin, "New best candidate recorded");
        Ok(true)
    }

    /// Write to a sibling temp file, then rename over the record. Rename is
    /// atomic on the same filesystem.
    fn write_atomic(&self, record: &BestRecord) -> Result<(), PromptTuneError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, record.render())?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl BestRecord {
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::parse(&content)
    }

    /// Plain-text block: key/value header, separator line, instruction body.
    pub fn render(&self) -> String {
        format!(
            "score: {:.4}\nword_count: {}\naffirmative_count: {}\ncandidate_ordinal: {}\norigin: {}\nrecorded_at: {}\n{}\n{}\n",
            self.score,
            self.diagnostics.word_count,
            self.diagnostics.affirmative_count,
            self.diagnostics.candidate_ordinal,
            self.origin,
            self.recorded_at,
            HEADER_SEPARATOR,
            self.instruction,
        )
    }

    pub fn parse(content: &str) -> Option<Self> {
        let (header, body) = content.split_once(&format!("{HEADER_SEPARATOR}\n"))?;

        let mut score = None;
        let mut diagnostics = Diagnostics::default();
        let mut origin = String::new();
        let mut recorded_at = String::new();

        for line in header.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "score" => score = value.parse().ok(),
                "word_count" => diagnostics.word_count = value.parse().unwrap_or(0),
                "affirmative_count" => diagnostics.affirmative_count = value.parse().unwrap_or(0),
                "candidate_ordinal" => diagnostics.candidate_ordinal = value.parse().unwrap_or(0),
                "origin" => origin = value.to_string(),
                "recorded_at" => recorded_at = value.to_string(),
                _ => {}
            }
        }

        Some(Self {
            score: score?,
            diagnostics,
            origin,
            recorded_at,
            instruction: body.trim_end().to_string(),
        })
    }
}
