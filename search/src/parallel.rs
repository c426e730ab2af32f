//! Parallel BFS: a shared frontier queue, a shared visited set, and
//! cooperative cancellation once any worker reaches the goal.
//!
//! Grounded on `original_source/src/search/ParallelSearch.*`, which only
//! ever parallelizes breadth-first expansion -- spec.md §4.4/§5 inherit
//! that restriction here rather than generalizing to every strategy. Uses
//! `std::thread::scope` and plain `Mutex`/`RwLock`, matching the teacher's
//! std-only concurrency (no rayon/crossbeam in its dependency stack).

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::thread;

use epistemic_kernel::bisim::{BisimGuard, BisimKind};
use epistemic_kernel::bitset::{ActionId, Agent};
use epistemic_kernel::domain::Domain;
use epistemic_kernel::formula::BeliefFormula;
use epistemic_kernel::proof::hash::ContentHash;
use epistemic_kernel::state::KripkeState;

use crate::engine::SearchOutcome;
use crate::error::TerminationReason;
use crate::search_state::SearchState;

/// Run a parallel breadth-first search with `worker_count` worker threads
/// (clamped to at least one).
#[must_use]
pub fn run_parallel_bfs(
    domain: &Domain,
    goal: Vec<BeliefFormula>,
    start: KripkeState,
    worker_count: usize,
    bisimulation: Option<BisimKind>,
    check_visited: bool,
) -> SearchOutcome {
    let root = SearchState::initial(start);
    if goal.iter().all(|g| root.state.entails(g)) {
        return SearchOutcome {
            reason: TerminationReason::InitialStateIsGoal,
            plan: Some(Vec::new()),
            expanded: 0,
        };
    }

    let frontier: Mutex<VecDeque<SearchState>> = Mutex::new(VecDeque::from(vec![root]));
    let visited: RwLock<BTreeSet<ContentHash>> = RwLock::new(BTreeSet::new());
    let found: Mutex<Option<SearchState>> = Mutex::new(None);
    let done = AtomicBool::new(false);
    let expanded = AtomicU64::new(0);
    let idle = AtomicUsize::new(0);

    let workers = worker_count.max(1);
    let agents: Vec<Agent> = domain.agents().collect();

    thread::scope(|scope| {
        for _ in 0..workers {
            let goal = &goal;
            let agents = &agents;
            let frontier = &frontier;
            let visited = &visited;
            let found = &found;
            let done = &done;
            let expanded = &expanded;
            let idle = &idle;
            scope.spawn(move || {
                let guard = BisimGuard::default();
                worker_loop(WorkerContext {
                    domain,
                    goal,
                    agents,
                    bisimulation,
                    check_visited,
                    guard: &guard,
                    frontier,
                    visited,
                    found,
                    done,
                    expanded,
                    idle,
                    workers,
                });
            });
        }
    });

    let expanded_total = expanded.load(Ordering::Relaxed);
    let found_node = found.lock().expect("found mutex poisoned").take();
    match found_node {
        Some(node) => SearchOutcome {
            reason: TerminationReason::GoalReached {
                plan_length: node.plan_length,
            },
            plan: Some(node.executed_actions),
            expanded: expanded_total,
        },
        None => SearchOutcome {
            reason: TerminationReason::FrontierExhausted {
                expanded: expanded_total,
            },
            plan: None,
            expanded: expanded_total,
        },
    }
}

struct WorkerContext<'a> {
    domain: &'a Domain,
    goal: &'a [BeliefFormula],
    agents: &'a [Agent],
    bisimulation: Option<BisimKind>,
    check_visited: bool,
    guard: &'a BisimGuard,
    frontier: &'a Mutex<VecDeque<SearchState>>,
    visited: &'a RwLock<BTreeSet<ContentHash>>,
    found: &'a Mutex<Option<SearchState>>,
    done: &'a AtomicBool,
    expanded: &'a AtomicU64,
    idle: &'a AtomicUsize,
    workers: usize,
}

fn worker_loop(ctx: WorkerContext<'_>) {
    loop {
        if ctx.done.load(Ordering::Relaxed) {
            return;
        }

        let node = ctx
            .frontier
            .lock()
            .expect("frontier mutex poisoned")
            .pop_front();

        let Some(node) = node else {
            // No work right now. If every worker observes the frontier
            // empty at once, nothing will ever refill it again.
            let now_idle = ctx.idle.fetch_add(1, Ordering::SeqCst) + 1;
            if now_idle >= ctx.workers {
                ctx.done.store(true, Ordering::SeqCst);
                return;
            }
            thread::yield_now();
            ctx.idle.fetch_sub(1, Ordering::SeqCst);
            continue;
        };

        ctx.expanded.fetch_add(1, Ordering::Relaxed);

        if ctx.goal.iter().all(|g| node.state.entails(g)) {
            let mut slot = ctx.found.lock().expect("found mutex poisoned");
            if slot.is_none() {
                *slot = Some(node);
            }
            ctx.done.store(true, Ordering::SeqCst);
            return;
        }

        if ctx.check_visited {
            let fp = node.fingerprint();
            let already_seen = {
                let mut seen = ctx.visited.write().expect("visited lock poisoned");
                !seen.insert(fp)
            };
            if already_seen {
                continue;
            }
        }

        let mut action_ids: Vec<ActionId> = ctx.domain.actions.keys().copied().collect();
        action_ids.sort();
        let mut children = Vec::new();
        for action_id in action_ids {
            let Some(action) = ctx.domain.action(action_id) else {
                continue;
            };
            let Ok(mut next_state) = node.state.apply_action(action) else {
                continue;
            };
            if let Some(kind) = ctx.bisimulation {
                next_state =
                    ctx.guard
                        .try_contract(&next_state, kind, ctx.agents, &ctx.domain.goal);
            }
            children.push(node.successor(action_id, next_state));
        }
        if !children.is_empty() {
            ctx.frontier
                .lock()
                .expect("frontier mutex poisoned")
                .extend(children);
        }
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
    fn parallel_bfs_finds_plan_with_multiple_workers() {
        let (domain, state) = one_action_domain();
        let outcome = run_parallel_bfs(&domain, vec![domain.goal.clone()], state, 4, None, false);
        assert_eq!(
            outcome.reason,
            TerminationReason::GoalReached { plan_length: 1 }
        );
    }

    #[test]
    fn parallel_bfs_single_worker_matches_sequential() {
        let (domain, state) = one_action_domain();
        let outcome = run_parallel_bfs(&domain, vec![domain.goal.clone()], state, 1, None, true);
        assert_eq!(
            outcome.reason,
            TerminationReason::GoalReached { plan_length: 1 }
        );
    }
}
