//! End-to-end scenarios from spec.md §8 "Concrete end-to-end scenarios":
//! parse a domain file, build the initial state, and run the search
//! engine against it, checking the plan the spec names.
//!
//! Grounded on `original_source`'s example domains under
//! `examples/*/domains` (coin-toss, selective-announcement, corridor) and
//! the teacher's own integration-test placement (`tests/` next to
//! `src/`, one file per crate, per the teacher's `tests/lock` layout).

use std::sync::Arc;

use epistemic_harness::domain_text::parse_domain;
use epistemic_kernel::bisim::{self, BisimKind};
use epistemic_kernel::formula::BeliefFormula;
use epistemic_kernel::state::KripkeState;
use epistemic_kernel::world::KripkeWorldStore;
use epistemic_search::engine;
use epistemic_search::error::TerminationReason;
use epistemic_search::policy::{SearchPolicy, Strategy};

fn build(source: &str) -> (epistemic_kernel::domain::Domain, KripkeState) {
    let (domain, fluent_count) = parse_domain(source).expect("domain parses");
    domain.validate().expect("domain is well-formed");
    let store = Arc::new(KripkeWorldStore::new());
    let start =
        KripkeState::build_initial(store, &domain, fluent_count).expect("initial state builds");
    (domain, start)
}

/// Scenario 1: one-agent sensing ("coin toss"). The agent starts ignorant
/// of `heads`; after `look` it knows the truth value either way.
#[test]
fn coin_toss_one_agent_sensing() {
    let source = "
        fluents: heads
        agents: a
        actions: look

        action look
          type sensing
          executability true
          fully a
        end

        initial
          ignorant a : a : heads
        end

        goal
          B a heads or B a not heads
        end
    ";
    let (domain, start) = build(source);
    assert!(
        !start.entails(&domain.goal),
        "agent should start ignorant of heads"
    );

    let policy = SearchPolicy::default();
    let outcome = engine::run(&domain, vec![domain.goal.clone()], start, &policy);
    match outcome.reason {
        TerminationReason::GoalReached { plan_length } => {
            assert_eq!(plan_length, 1);
            let plan = outcome.plan.expect("plan present on success");
            assert_eq!(plan.len(), 1);
            let look = domain.grounder.action_id("look").unwrap();
            assert_eq!(plan[0], look);
        }
        other => panic!("expected a length-1 plan, got {other:?}"),
    }
}

/// Scenario 2: two agents, one-way announcement. `a` is fully observant of
/// `tell_a`, `b` is oblivious. Since `p` already holds, the effect-free
/// announcement needs no precondition work; the goal `B(a, p)` is reached
/// by applying it once (the domain does not declare `p` known to `a`
/// initially, only that `p` is true).
#[test]
fn two_agent_one_way_announcement() {
    let source = "
        fluents: p
        agents: a, b
        actions: tell_a

        action tell_a
          type announcement
          executability true
          fully a
        end

        initial
          fact p
        end

        goal
          B a p
        end
    ";
    let (domain, start) = build(source);
    assert!(!start.entails(&domain.goal));

    let policy = SearchPolicy::default();
    let outcome = engine::run(&domain, vec![domain.goal.clone()], start, &policy);
    match outcome.reason {
        TerminationReason::GoalReached { plan_length } => {
            assert_eq!(plan_length, 1);
            let plan = outcome.plan.expect("plan present on success");
            let tell_a = domain.grounder.action_id("tell_a").unwrap();
            assert_eq!(plan, vec![tell_a]);
        }
        other => panic!("expected a length-1 plan, got {other:?}"),
    }
}

/// Scenario 3: an ontic action with partial observation. `a` is fully
/// observant of `open_a`, `b` merely partially observant (knows something
/// happened, not what). Goal: `a` knows the door is open, and `b` knows
/// that `a` knows the truth value of `open_a` one way or the other.
#[test]
fn ontic_action_with_partial_observation() {
    let source = "
        fluents: open_a, open_b
        agents: a, b
        actions: open_a_action

        action open_a_action
          type ontic
          executability true
          effect open_a
          fully a
          partially b
        end

        initial
          common a, b : not open_a and not open_b
        end

        goal
          B a open_a and B b (B a open_a or B a not open_a)
        end
    ";
    let (domain, start) = build(source);
    assert!(!start.entails(&domain.goal));

    let policy = SearchPolicy::default();
    let outcome = engine::run(&domain, vec![domain.goal.clone()], start, &policy);
    match outcome.reason {
        TerminationReason::GoalReached { plan_length } => {
            assert_eq!(plan_length, 1);
            let plan = outcome.plan.expect("plan present on success");
            let open_a_action = domain.grounder.action_id("open_a_action").unwrap();
            assert_eq!(plan, vec![open_a_action]);
        }
        other => panic!("expected a length-1 plan, got {other:?}"),
    }
}

/// Scenario 4: bisimulation equivalence. The contracted state entails the
/// domain's goal iff the original does, and never has more worlds.
#[test]
fn bisimulation_preserves_goal_entailment() {
    let source = "
        fluents: heads
        agents: a
        actions: look

        action look
          type sensing
          executability true
          fully a
        end

        initial
          ignorant a : a : heads
        end

        goal
          B a heads or B a not heads
        end
    ";
    let (domain, start) = build(source);
    let agents: Vec<_> = domain.agents().collect();

    for state in [start.clone(), start.apply_action(
        domain.action(domain.grounder.action_id("look").unwrap()).unwrap(),
    ).unwrap()] {
        for kind in [BisimKind::PaigeTarjan, BisimKind::Fast] {
            let contracted = bisim::contract(&state, kind, &agents);
            assert_eq!(
                state.entails(&domain.goal),
                contracted.entails(&domain.goal),
                "contraction must preserve goal entailment ({kind:?})"
            );
            assert!(contracted.worlds().len() <= state.worlds().len());
        }
    }
}

/// Scenario 4b: contraction is idempotent.
#[test]
fn bisimulation_is_idempotent() {
    let source = "
        fluents: p, q
        agents: a, b
        actions: act

        action act
          type ontic
          executability true
          effect p
          fully a
        end

        initial
          common a, b : p or not p
        end

        goal
          p
        end
    ";
    let (domain, start) = build(source);
    let agents: Vec<_> = domain.agents().collect();

    let once = bisim::contract(&start, BisimKind::Fast, &agents);
    let twice = bisim::contract(&once, BisimKind::Fast, &agents);
    assert_eq!(once.worlds().len(), twice.worlds().len());
    assert_eq!(once.entails(&domain.goal), twice.entails(&domain.goal));
}

/// Scenario 5: IDDFS depth extension. A corridor-style domain whose
/// shortest plan needs 4 ontic steps; with a depth cap starting below that
/// and growing by 1 each time the stack empties, IDDFS must still find the
/// plan once the cap reaches the required depth.
#[test]
fn iddfs_extends_depth_until_plan_found() {
    let source = "
        fluents: s0, s1, s2, s3, s4
        agents: a
        actions: step1, step2, step3, step4

        action step1
          type ontic
          executability s0
          effect s1
        end

        action step2
          type ontic
          executability s1
          effect s2
        end

        action step3
          type ontic
          executability s2
          effect s3
        end

        action step4
          type ontic
          executability s3
          effect s4
        end

        initial
          fact s0 and not s1 and not s2 and not s3 and not s4
        end

        goal
          s4
        end
    ";
    let (domain, start) = build(source);
    let policy = SearchPolicy {
        strategy: Strategy::Iddfs,
        iddfs_initial_cap: 2,
        iddfs_step: 1,
        ..SearchPolicy::default()
    };
    let outcome = engine::run(&domain, vec![domain.goal.clone()], start, &policy);
    match outcome.reason {
        TerminationReason::GoalReached { plan_length } => assert_eq!(plan_length, 4),
        other => panic!("expected IDDFS to find the depth-4 plan, got {other:?}"),
    }
}

/// Boundary behaviour: an action with an empty executability list (`true`)
/// is always executable, even at a state where every fluent is false.
#[test]
fn action_with_trivial_executability_always_fires() {
    let source = "
        fluents: p
        agents: a
        actions: act

        action act
          type ontic
          executability true
          effect p
        end

        initial
        end

        goal
          p
        end
    ";
    let (domain, start) = build(source);
    let act = domain.action(domain.grounder.action_id("act").unwrap()).unwrap();
    assert!(start.is_executable(act));
    let next = start.apply_action(act).unwrap();
    assert!(next.entails(&domain.goal));
}

/// Boundary behaviour: a goal already true in the initial state is
/// reported via `InitialStateIsGoal`, not as a length-0 "plan found".
#[test]
fn goal_already_true_initially_is_reported_distinctly() {
    let source = "
        fluents: p
        agents: a
        actions: noop

        action noop
          type ontic
          executability true
        end

        initial
          fact p
        end

        goal
          p
        end
    ";
    let (domain, start) = build(source);
    assert!(start.entails(&domain.goal));
    let policy = SearchPolicy::default();
    let outcome = engine::run(&domain, vec![domain.goal.clone()], start, &policy);
    assert_eq!(outcome.reason, TerminationReason::InitialStateIsGoal);
}

/// BFS returns a shortest plan when more than one plan exists: a two-step
/// detour action is declared alongside a direct one-step action, and BFS
/// must prefer the shorter.
#[test]
fn bfs_returns_minimum_length_plan() {
    let source = "
        fluents: p, q
        agents: a
        actions: direct, detour1, detour2

        action direct
          type ontic
          executability true
          effect p
        end

        action detour1
          type ontic
          executability true
          effect q
        end

        action detour2
          type ontic
          executability q
          effect p
        end

        initial
        end

        goal
          p
        end
    ";
    let (domain, start) = build(source);
    let policy = SearchPolicy::default();
    let outcome = engine::run(&domain, vec![domain.goal.clone()], start, &policy);
    match outcome.reason {
        TerminationReason::GoalReached { plan_length } => assert_eq!(plan_length, 1),
        other => panic!("expected the 1-step plan, got {other:?}"),
    }
}
