// src/core/state.rs — Search state and call-budget accounting

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::types::Candidate;

/// Counter for expensive external calls (generator, judge, reflection).
/// Shared across concurrent evaluations within one step.
#[derive(Debug)]
pub struct CallBudget {
    used: AtomicU32,
    budget: u32,
}

impl CallBudget {
    pub fn new(budget: u32) -> Self {
        Self {
            used: AtomicU32::new(0),
            budget,
        }
    }

    /// Atomically reserve `calls` units if they fit under the budget.
    /// Returns false (and charges nothing) when they do not. Reserving
    /// before a call is what keeps concurrent evaluations from overshooting
    /// the ceiling.
    pub fn try_reserve(&self, calls: u32) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                let next = used.saturating_add(calls);
                (next <= self.budget).then_some(next)
            })
            .is_ok()
    }

    /// Return reserved units that were not consumed (judge skipped by the
    /// short-circuit, for example).
    pub fn refund(&self, calls: u32) {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(calls))
            })
            .ok();
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn exhausted(&self) -> bool {
        self.used() >= self.budget
    }
}

/// Best candidate slot with compare-and-set update semantics. Concurrent
/// evaluations may race to report scores; a lagging high-score write must
/// never be clobbered by a later low-score one, and on equal score the
/// incumbent wins so noisy judges cannot cause churn.
#[derive(Debug)]
pub struct BestSlot {
    inner: Mutex<Option<(Candidate, f32)>>,
}

impl BestSlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Install `candidate` iff `score` strictly beats the current best.
    /// Returns true when the slot changed.
    pub fn offer(&self, candidate: &Candidate, score: f32) -> bool {
        let mut slot = self.inner.lock().expect("best slot poisoned");
        match slot.as_ref() {
            Some((_, best)) if score <= *best => false,
            _ => {
                *slot = Some((candidate.clone(), score));
                true
            }
        }
    }

    pub fn get(&self) -> Option<(Candidate, f32)> {
        self.inner.lock().expect("best slot poisoned").clone()
    }

    pub fn best_score(&self) -> Option<f32> {
        self.get().map(|(_, s)| s)
    }
}

impl Default for BestSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned exclusively by one search run.
pub struct SearchState {
    pub current: Candidate,
    pub best: BestSlot,
    pub budget: CallBudget,
    /// Ordinal handed to the next reflected candidate.
    pub next_ordinal: u32,
}

impl SearchState {
    pub fn new(seed: Candidate, calls_budget: u32) -> Self {
        Self {
            current: seed,
            best: BestSlot::new(),
            budget: CallBudget::new(calls_budget),
            next_ordinal: 1,
        }
    }

    pub fn take_ordinal(&mut self) -> u32 {
        let ord = self.next_ordinal;
        self.next_ordinal += 1;
        ord
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Candidate;

    #[test]
    fn test_reservations_accumulate() {
        let b = CallBudget::new(5);
        assert!(!b.exhausted());
        assert!(b.try_reserve(2));
        assert!(b.try_reserve(2));
        assert_eq!(b.used(), 4);
        assert!(!b.exhausted());
        assert!(b.try_reserve(1));
        assert!(b.exhausted());
        assert_eq!(b.budget(), 5);
    }

    #[test]
    fn test_budget_zero_is_immediately_exhausted() {
        let b = CallBudget::new(0);
        assert!(b.exhausted());
        assert!(!b.try_reserve(1));
    }

    #[test]
    fn test_try_reserve_respects_ceiling() {
        let b = CallBudget::new(3);
        assert!(b.try_reserve(2));
        assert!(!b.try_reserve(2));
        assert!(b.try_reserve(1));
        assert!(b.exhausted());
        assert_eq!(b.used(), 3);
    }

    #[test]
    fn test_refund_returns_unused_reservation() {
        let b = CallBudget::new(2);
        assert!(b.try_reserve(2));
        b.refund(1);
        assert_eq!(b.used(), 1);
        assert!(b.try_reserve(1));
    }

    #[test]
    fn test_best_slot_first_offer_wins() {
        let slot = BestSlot::new();
        let c = Candidate::seed("a");
        assert!(slot.offer(&c, 0.3));
        assert_eq!(slot.best_score(), Some(0.3));
    }

    #[test]
    fn test_best_slot_rejects_equal_score() {
        let slot = BestSlot::new();
        let first = Candidate::seed("first");
        let second = Candidate::reflected("second", 1);
        assert!(slot.offer(&first, 0.5));
        assert!(!slot.offer(&second, 0.5));
        assert_eq!(slot.get().unwrap().0.instruction, "first");
    }

    #[test]
    fn test_best_slot_rejects_lower_score() {
        let slot = BestSlot::new();
        assert!(slot.offer(&Candidate::seed("a"), 0.8));
        assert!(!slot.offer(&Candidate::reflected("b", 1), 0.2));
        assert_eq!(slot.best_score(), Some(0.8));
    }

    #[test]
    fn test_best_slot_monotone_under_interleaving() {
        let slot = BestSlot::new();
        let scores = [0.1, 0.7, 0.3, 0.7, 0.9, 0.2];
        let mut last_best = f32::NEG_INFINITY;
        for (i, s) in scores.iter().enumerate() {
            slot.offer(&Candidate::reflected(format!("c{i}"), i as u32), *s);
            let best = slot.best_score().unwrap();
            assert!(best >= last_best, "best score regressed");
            last_best = best;
        }
        assert_eq!(last_best, 0.9);
    }

    #[test]
    fn test_ordinals_increase() {
        let mut state = SearchState::new(Candidate::seed("s"), 10);
        assert_eq!(state.take_ordinal(), 1);
        assert_eq!(state.take_ordinal(), 2);
    }
}
