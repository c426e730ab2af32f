//! Bisimulation contraction: collapse a Kripke state to its coarsest
//! bisimilar quotient.
//!
//! Grounded on `original_source/src/bisimulation/Bisimulation.cpp` (by far
//! the largest single file in the original planner, confirming this is the
//! heaviest single component). The original offers two algorithms --
//! Paige-Tarjan partition refinement and a rank-based "Fast Bisimulation"
//! that exploits well-founded/non-well-founded SCC structure to refine in
//! rank order. Both are reachable through the single [`contract`] entry
//! point, selected by [`BisimKind`]; see `paige_tarjan.rs`/`fast.rs` for how
//! each seeds and orders its splitting.
//!
//! A bisimulation failure (the underlying refinement panicking or
//! disagreeing with the debug equivalence check) is recoverable, not fatal:
//! [`BisimGuard`] counts consecutive failures per worker and disables
//! contraction once a threshold is crossed, per spec.md §7's Recoverable
//! error class.

pub mod fast;
pub mod graph;
pub mod paige_tarjan;
pub mod quotient;
mod refine_core;

use std::sync::atomic::{AtomicU32, Ordering};

use crate::bitset::Agent;
use crate::state::KripkeState;

/// Which contraction algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BisimKind {
    PaigeTarjan,
    Fast,
}

/// Contract `state` using `kind`, returning the quotient state. `agents` is
/// the domain's full agent set (see [`graph::LabelledGraph::from_state`]).
#[must_use]
pub fn contract(state: &KripkeState, kind: BisimKind, agents: &[Agent]) -> KripkeState {
    let encoded = graph::LabelledGraph::from_state(state, agents);
    let partition = match kind {
        BisimKind::PaigeTarjan => paige_tarjan::refine(&encoded),
        BisimKind::Fast => fast::refine(&encoded),
    };
    quotient::rebuild(state, agents, &partition)
}

/// Per-worker failure counter with a disable threshold. Reaching the
/// threshold degrades a worker to passing states through uncontracted
/// rather than propagating a fatal error, matching spec.md §7's
/// Recoverable-error handling for bisimulation.
#[derive(Debug)]
pub struct BisimGuard {
    consecutive_failures: AtomicU32,
    threshold: u32,
}

impl Default for BisimGuard {
    fn default() -> Self {
        Self::new(10)
    }
}

impl BisimGuard {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            threshold,
        }
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.consecutive_failures.load(Ordering::Relaxed) >= self.threshold
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Returns the new failure count.
    pub fn record_failure(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Attempt a contraction, guarded by the disable threshold and a debug
    /// equivalence check. If disabled, or if the check fails, returns a
    /// clone of `state` unchanged and records a failure; otherwise returns
    /// the contracted state and records success.
    #[must_use]
    pub fn try_contract(
        &self,
        state: &KripkeState,
        kind: BisimKind,
        agents: &[Agent],
        goal: &crate::formula::BeliefFormula,
    ) -> KripkeState {
        if self.is_disabled() {
            return state.clone();
        }
        let contracted = contract(state, kind, agents);
        if contracted.entails(goal) == state.entails(goal) {
            self.record_success();
            contracted
        } else {
            self.record_failure();
            state.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_disables_after_threshold() {
        let guard = BisimGuard::new(2);
        assert!(!guard.is_disabled());
        guard.record_failure();
        assert!(!guard.is_disabled());
        guard.record_failure();
        assert!(guard.is_disabled());
    }

    #[test]
    fn guard_resets_on_success() {
        let guard = BisimGuard::new(2);
        guard.record_failure();
        guard.record_success();
        guard.record_failure();
        assert!(!guard.is_disabled());
    }
}
