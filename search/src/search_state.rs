//! The search engine's node type: a Kripke state plus plan bookkeeping.
//!
//! Grounded on the teacher's `SearchNodeV1`/`FrontierKey` split (immutable
//! node + a separate, cheaply-copyable ordering key) generalized from
//! `(f_cost, depth, creation_order)` over a byte-state to spec.md's
//! `(pointed, worlds, beliefs)` total order over a `KripkeState`, carried
//! via [`KripkeState::canonical_fingerprint`].

use epistemic_kernel::bitset::ActionId;
use epistemic_kernel::proof::hash::ContentHash;
use epistemic_kernel::state::KripkeState;

/// A `KripkeState` in flight through the search engine, with everything
/// needed to reconstruct the plan once a goal is found.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub state: KripkeState,
    pub plan_length: u16,
    pub executed_actions: Vec<ActionId>,
    /// `None` until a heuristic scores this state; negative values mark a
    /// state unreachable-to-goal under the active heuristic (spec.md §3).
    pub heuristic_value: Option<i32>,
}

impl SearchState {
    #[must_use]
    pub fn initial(state: KripkeState) -> Self {
        Self {
            state,
            plan_length: 0,
            executed_actions: Vec::new(),
            heuristic_value: None,
        }
    }

    #[must_use]
    pub fn successor(&self, action_id: ActionId, state: KripkeState) -> Self {
        let mut executed_actions = self.executed_actions.clone();
        executed_actions.push(action_id);
        Self {
            state,
            plan_length: self.plan_length + 1,
            executed_actions,
            heuristic_value: None,
        }
    }

    /// A state whose heuristic value is negative is unreachable-to-goal
    /// under the chosen heuristic and must not be enqueued, except the
    /// initial state (spec.md §3's "Search state" invariant).
    #[must_use]
    pub fn is_heuristically_dead(&self) -> bool {
        matches!(self.heuristic_value, Some(v) if v < 0)
    }

    /// The total-order fingerprint used for visited-set membership and as
    /// the tie-breaking key in priority-queue comparisons.
    #[must_use]
    pub fn fingerprint(&self) -> ContentHash {
        self.state.canonical_fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epistemic_kernel::domain::Domain;
    use epistemic_kernel::formula::BeliefFormula;
    use epistemic_kernel::grounder::GrounderBuilder;
    use epistemic_kernel::world::KripkeWorldStore;
    use std::sync::Arc;

    fn initial() -> SearchState {
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("p");
        let grounder = builder.build();
        let domain = Domain::new(grounder, BeliefFormula::Top, 5);
        let store = Arc::new(KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();
        SearchState::initial(state)
    }

    #[test]
    fn successor_bumps_plan_length_and_records_action() {
        let root = initial();
        let child = root.successor(ActionId(3), root.state.clone());
        assert_eq!(child.plan_length, 1);
        assert_eq!(child.executed_actions, vec![ActionId(3)]);
    }

    #[test]
    fn negative_heuristic_marks_dead_except_when_absent() {
        let mut s = initial();
        assert!(!s.is_heuristically_dead());
        s.heuristic_value = Some(-1);
        assert!(s.is_heuristically_dead());
        s.heuristic_value = Some(0);
        assert!(!s.is_heuristically_dead());
    }

    #[test]
    fn fingerprint_is_stable_across_clones() {
        let s = initial();
        assert_eq!(s.fingerprint(), s.clone().fingerprint());
    }
}
