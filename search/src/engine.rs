//! The single-threaded search engine: drives any [`OpenList`] to a plan or
//! exhaustion, per spec.md §4.4's expansion loop.
//!
//! Grounded on `original_source/src/search/SearchEngine.*`'s generic
//! expand-check-enqueue loop, generalized over the `OpenList` trait instead
//! of a single hardcoded strategy.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use epistemic_kernel::bisim::BisimGuard;
use epistemic_kernel::bitset::{ActionId, Agent};
use epistemic_kernel::domain::Domain;
use epistemic_kernel::formula::BeliefFormula;
use epistemic_kernel::proof::hash::ContentHash;
use epistemic_kernel::state::KripkeState;

use crate::error::TerminationReason;
use crate::frontier::{AStarOpenList, BfsOpenList, DfsOpenList, HeuristicFirstOpenList, IddfsOpenList, OpenList};
use crate::heuristic::HeuristicManager;
use crate::policy::{SearchPolicy, Strategy};
use crate::search_state::SearchState;

/// The result of running one search to completion.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub reason: TerminationReason,
    pub plan: Option<Vec<ActionId>>,
    pub expanded: u64,
}

/// Run `policy` against `domain` from `start` toward `goal`.
#[must_use]
pub fn run(
    domain: &Domain,
    goal: Vec<BeliefFormula>,
    start: KripkeState,
    policy: &SearchPolicy,
) -> SearchOutcome {
    run_cancellable(domain, goal, start, policy, None)
}

/// Run `policy` as [`run`] does, but check `cancel` (if given) at the top
/// of each expansion and stop early with [`TerminationReason::Cancelled`]
/// once it is observed set. Used by the portfolio runner, whose
/// configurations race each other and cooperatively stop the losers
/// (spec.md §4.4 "Portfolio runner").
#[must_use]
pub fn run_cancellable(
    domain: &Domain,
    goal: Vec<BeliefFormula>,
    start: KripkeState,
    policy: &SearchPolicy,
    cancel: Option<&AtomicBool>,
) -> SearchOutcome {
    let heuristic = HeuristicManager::new(domain, goal.clone(), policy.heuristic);
    run_with_heuristic(domain, goal, start, policy, heuristic, cancel)
}

/// Run as [`run_cancellable`] does, but score with a caller-supplied
/// [`HeuristicManager`] instead of building a default (oracle-less) one.
/// Lets a harness wire an external [`crate::heuristic::GnnOracle`] in for
/// `HeuristicKind::Gnn` before the search starts (spec.md §6 "GNN heuristic
/// oracle").
#[must_use]
pub fn run_with_heuristic(
    domain: &Domain,
    goal: Vec<BeliefFormula>,
    start: KripkeState,
    policy: &SearchPolicy,
    heuristic: HeuristicManager<'_>,
    cancel: Option<&AtomicBool>,
) -> SearchOutcome {
    let agents: Vec<Agent> = domain.agents().collect();
    let bisim_guard = BisimGuard::default();

    let mut root = SearchState::initial(start);
    if policy.strategy.uses_heuristic() {
        root.heuristic_value = Some(heuristic.score(&root.state, root.plan_length));
    }

    if goal_satisfied(&goal, &root) {
        return SearchOutcome {
            reason: TerminationReason::InitialStateIsGoal,
            plan: Some(Vec::new()),
            expanded: 0,
        };
    }

    if policy.strategy == Strategy::Iddfs {
        return run_iddfs(domain, &goal, policy, &heuristic, &agents, &bisim_guard, root, cancel);
    }

    let mut visited = BTreeSet::new();
    let (found, expanded, cancelled) = match policy.strategy {
        Strategy::Bfs => {
            let mut open = BfsOpenList::new();
            open.push(root);
            drain(domain, &goal, policy, &heuristic, &agents, &bisim_guard, &mut open, &mut visited, cancel)
        }
        Strategy::Dfs => {
            let mut open = DfsOpenList::new();
            open.push(root);
            drain(domain, &goal, policy, &heuristic, &agents, &bisim_guard, &mut open, &mut visited, cancel)
        }
        Strategy::HeuristicFirst => {
            let mut open = HeuristicFirstOpenList::new();
            open.push(root);
            drain(domain, &goal, policy, &heuristic, &agents, &bisim_guard, &mut open, &mut visited, cancel)
        }
        Strategy::AStar => {
            let mut open = AStarOpenList::new();
            open.push(root);
            drain(domain, &goal, policy, &heuristic, &agents, &bisim_guard, &mut open, &mut visited, cancel)
        }
        Strategy::Iddfs => unreachable!("handled above"),
    };

    if cancelled {
        return SearchOutcome {
            reason: TerminationReason::Cancelled { expanded },
            plan: None,
            expanded,
        };
    }
    finish(found, expanded)
}

fn goal_satisfied(goal: &[BeliefFormula], node: &SearchState) -> bool {
    goal.iter().all(|g| node.state.entails(g))
}

fn finish(found: Option<SearchState>, expanded: u64) -> SearchOutcome {
    match found {
        Some(node) => SearchOutcome {
            reason: TerminationReason::GoalReached {
                plan_length: node.plan_length,
            },
            plan: Some(node.executed_actions),
            expanded,
        },
        None => SearchOutcome {
            reason: TerminationReason::FrontierExhausted { expanded },
            plan: None,
            expanded,
        },
    }
}

/// Pop/check/expand/push until the open list empties, the goal is found, or
/// `cancel` is observed set. Returns `(found, expanded, was_cancelled)`.
#[allow(clippy::too_many_arguments)]
fn drain(
    domain: &Domain,
    goal: &[BeliefFormula],
    policy: &SearchPolicy,
    heuristic: &HeuristicManager<'_>,
    agents: &[Agent],
    bisim_guard: &BisimGuard,
    open: &mut dyn OpenList,
    visited: &mut BTreeSet<ContentHash>,
    cancel: Option<&AtomicBool>,
) -> (Option<SearchState>, u64, bool) {
    let mut expanded = 0u64;
    while let Some(node) = open.pop() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return (None, expanded, true);
        }
        expanded += 1;

        if goal_satisfied(goal, &node) {
            return (Some(node), expanded, false);
        }

        if policy.check_visited && !visited.insert(node.fingerprint()) {
            continue;
        }

        let mut action_ids: Vec<ActionId> = domain.actions.keys().copied().collect();
        action_ids.sort();
        for action_id in action_ids {
            let Some(action) = domain.action(action_id) else {
                continue;
            };
            let Ok(mut next_state) = node.state.apply_action(action) else {
                continue;
            };
            if let Some(kind) = policy.bisimulation {
                next_state = bisim_guard.try_contract(&next_state, kind, agents, &domain.goal);
            }
            let mut child = node.successor(action_id, next_state);
            if policy.strategy.uses_heuristic() {
                child.heuristic_value = Some(heuristic.score(&child.state, child.plan_length));
            }
            open.push(child);
        }
    }
    (None, expanded, false)
}

/// IDDFS's outer loop: run `drain` at increasing depth caps, starting a
/// fresh visited set and frontier each iteration, until either a goal is
/// found, an iteration prunes nothing (meaning the whole reachable space was
/// already explored), or the domain's `max_depth` is exceeded.
#[allow(clippy::too_many_arguments)]
fn run_iddfs(
    domain: &Domain,
    goal: &[BeliefFormula],
    policy: &SearchPolicy,
    heuristic: &HeuristicManager<'_>,
    agents: &[Agent],
    bisim_guard: &BisimGuard,
    root: SearchState,
    cancel: Option<&AtomicBool>,
) -> SearchOutcome {
    let mut cap = policy.iddfs_initial_cap;
    let mut total_expanded = 0u64;
    let step = policy.iddfs_step.max(1);

    loop {
        let mut visited = BTreeSet::new();
        let mut open = IddfsOpenList::new(root.clone(), cap);
        let (found, expanded, cancelled) = drain(
            domain,
            goal,
            policy,
            heuristic,
            agents,
            bisim_guard,
            &mut open,
            &mut visited,
            cancel,
        );
        total_expanded += expanded;

        if cancelled {
            return SearchOutcome {
                reason: TerminationReason::Cancelled {
                    expanded: total_expanded,
                },
                plan: None,
                expanded: total_expanded,
            };
        }
        if let Some(node) = found {
            return SearchOutcome {
                reason: TerminationReason::GoalReached {
                    plan_length: node.plan_length,
                },
                plan: Some(node.executed_actions),
                expanded: total_expanded,
            };
        }
        if !open.pruned_any() || cap >= domain.max_depth {
            return SearchOutcome {
                reason: TerminationReason::FrontierExhausted {
                    expanded: total_expanded,
                },
                plan: None,
                expanded: total_expanded,
            };
        }
        cap = cap.saturating_add(step).min(domain.max_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epistemic_kernel::action::{Action, ActionKind};
    use epistemic_kernel::bitset::{Fluent, FluentsSet};
    use epistemic_kernel::formula::FluentFormula;
    use epistemic_kernel::grounder::GrounderBuilder;
    use epistemic_kernel::world::KripkeWorldStore;
    use std::sync::Arc;

    fn one_action_domain() -> (Domain, KripkeState) {
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("p");
        let action_id = builder.register_action("flip");
        let grounder = builder.build();
        let goal = BeliefFormula::Fluent(Fluent::new(0, true));
        let mut domain = Domain::new(grounder, goal, 5);
        let mut action = Action::new(action_id, ActionKind::Ontic, BeliefFormula::Top);
        let effect = FluentFormula::from_singleton(
            FluentsSet::try_from_literals([Fluent::new(0, true)]).unwrap(),
        );
        action.effects.insert(effect, BeliefFormula::Top);
        domain.actions.insert(action_id, action);
        let store = Arc::new(KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();
        (domain, state)
    }

    #[test]
    fn bfs_finds_one_step_plan() {
        let (domain, state) = one_action_domain();
        let policy = SearchPolicy::default();
        let outcome = run(&domain, vec![domain.goal.clone()], state, &policy);
        assert_eq!(
            outcome.reason,
            TerminationReason::GoalReached { plan_length: 1 }
        );
        assert_eq!(outcome.plan.unwrap().len(), 1);
    }

    #[test]
    fn iddfs_finds_same_plan_as_bfs() {
        let (domain, state) = one_action_domain();
        let policy = SearchPolicy {
            strategy: Strategy::Iddfs,
            ..SearchPolicy::default()
        };
        let outcome = run(&domain, vec![domain.goal.clone()], state, &policy);
        assert_eq!(
            outcome.reason,
            TerminationReason::GoalReached { plan_length: 1 }
        );
    }

    #[test]
    fn a_star_finds_plan_with_heuristic() {
        let (domain, state) = one_action_domain();
        let policy = SearchPolicy {
            strategy: Strategy::AStar,
            heuristic: crate::heuristic::HeuristicKind::LPg,
            ..SearchPolicy::default()
        };
        let outcome = run(&domain, vec![domain.goal.clone()], state, &policy);
        assert_eq!(
            outcome.reason,
            TerminationReason::GoalReached { plan_length: 1 }
        );
    }

    #[test]
    fn cancelled_flag_stops_the_engine_before_expansion() {
        let (domain, state) = one_action_domain();
        let policy = SearchPolicy::default();
        let cancel = AtomicBool::new(true);
        let outcome =
            run_cancellable(&domain, vec![domain.goal.clone()], state, &policy, Some(&cancel));
        assert_eq!(outcome.reason, TerminationReason::Cancelled { expanded: 0 });
    }

    #[test]
    fn initial_state_already_goal_short_circuits() {
        let (domain, state) = one_action_domain();
        let next = state.apply_action(domain.action(ActionId(0)).unwrap()).unwrap();
        let policy = SearchPolicy::default();
        let outcome = run(&domain, vec![domain.goal.clone()], next, &policy);
        assert_eq!(outcome.reason, TerminationReason::InitialStateIsGoal);
        assert_eq!(outcome.plan, Some(Vec::new()));
    }
}
