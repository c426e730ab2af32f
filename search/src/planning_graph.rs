//! The epistemic planning graph: a layered relaxed-reachability structure
//! over fluents and belief formulae, used to score states for the
//! heuristic manager (spec.md §4.3).
//!
//! Grounded on `original_source/src/heuristics/heuristics_strategies/epg/`
//! (`StateLevel`, `ActionLevel`, `PlanningGraph`). Delete effects are never
//! applied during expansion -- like classical relaxed planning graphs,
//! this structure only ever moves a fluent or belief formula from unknown
//! (`-1`) to known-true at some depth, never back, which is what gives the
//! monotonicity property spec.md §8 tests for.

use std::collections::{BTreeMap, BTreeSet};

use epistemic_kernel::action::{Action, ObservedRole};
use epistemic_kernel::bitset::{ActionId, Agent, Fluent};
use epistemic_kernel::domain::Domain;
use epistemic_kernel::formula::BeliefFormula;
use epistemic_kernel::state::KripkeState;

/// Fluent- and belief-formula-score maps for one depth of the graph. `-1`
/// means "not yet known true"; any other value is the depth of first
/// discovery.
#[derive(Debug, Clone, Default)]
pub struct StateLevel {
    pub fluents: BTreeMap<Fluent, i32>,
    pub beliefs: BTreeMap<BeliefFormula, i32>,
}

impl StateLevel {
    fn fluent_score(&self, lit: Fluent) -> i32 {
        *self.fluents.get(&lit).unwrap_or(&-1)
    }

    fn belief_score(&self, bf: &BeliefFormula) -> i32 {
        *self.beliefs.get(bf).unwrap_or(&-1)
    }

    fn holds(&self, bf: &BeliefFormula) -> bool {
        match bf {
            BeliefFormula::Top => true,
            BeliefFormula::Fluent(lit) => self.fluent_score(*lit) >= 0,
            _ => self.belief_score(bf) >= 0,
        }
    }
}

/// Collect every subformula appearing anywhere in `bf` (including `bf`
/// itself) into `out`. Used to build the fixed universe of belief formulae
/// the graph tracks scores for.
fn collect_subformulas(bf: &BeliefFormula, out: &mut BTreeSet<BeliefFormula>) {
    out.insert(bf.clone());
    match bf {
        BeliefFormula::Top | BeliefFormula::Fluent(_) => {}
        BeliefFormula::Not(inner) => collect_subformulas(inner, out),
        BeliefFormula::And(parts) | BeliefFormula::Or(parts) => {
            for p in parts {
                collect_subformulas(p, out);
            }
        }
        BeliefFormula::Believes(_, inner)
        | BeliefFormula::Everyone(_, inner)
        | BeliefFormula::Common(_, inner)
        | BeliefFormula::Distributed(_, inner) => collect_subformulas(inner, out),
    }
}

fn role_of_group(
    level: &StateLevel,
    action: &Action,
    group: &BTreeSet<Agent>,
) -> ObservedRole {
    let mut any_oblivious = false;
    let mut all_fully = true;
    for agent in group {
        let role = action.role_of(*agent, |f| level.holds(f));
        match role {
            ObservedRole::Fully => {}
            ObservedRole::Partially => all_fully = false,
            ObservedRole::Oblivious => {
                all_fully = false;
                any_oblivious = true;
            }
        }
    }
    if any_oblivious {
        ObservedRole::Oblivious
    } else if all_fully {
        ObservedRole::Fully
    } else {
        ObservedRole::Partially
    }
}

/// Recursively decide whether `bf` becomes entailed after an ontic action's
/// effect, given the (already fluent-updated) next level and the acting
/// observance structure.
fn ontic_upgrade(level: &StateLevel, bf: &BeliefFormula, action: &Action) -> bool {
    match bf {
        BeliefFormula::Top => true,
        BeliefFormula::Fluent(lit) => level.fluent_score(*lit) >= 0,
        BeliefFormula::Not(_) => false,
        BeliefFormula::And(parts) => parts.iter().all(|p| ontic_upgrade(level, p, action)),
        BeliefFormula::Or(parts) => parts.iter().any(|p| ontic_upgrade(level, p, action)),
        BeliefFormula::Believes(agent, inner) => {
            matches!(
                action.role_of(*agent, |f| level.holds(f)),
                ObservedRole::Fully
            ) && ontic_upgrade(level, inner, action)
        }
        BeliefFormula::Everyone(group, inner) | BeliefFormula::Common(group, inner) => {
            matches!(role_of_group(level, action, group), ObservedRole::Fully)
                && ontic_upgrade(level, inner, action)
        }
        BeliefFormula::Distributed(group, inner) => {
            group
                .iter()
                .any(|a| matches!(action.role_of(*a, |f| level.holds(f)), ObservedRole::Fully))
                && ontic_upgrade(level, inner, action)
        }
    }
}

/// Recursively decide whether `bf` becomes entailed after a sensing or
/// announcement action with sensed literal `ef`. `vis` tracks how deep
/// under an observing-agent modality we are: 0 at entry, 1 once under a
/// fully-observant B/C, 2 once under a partially-observant one (spec.md
/// §4.3's `applyEpistemicEffects`).
fn epistemic_upgrade(
    level: &StateLevel,
    bf: &BeliefFormula,
    action: &Action,
    ef: Fluent,
    vis: u8,
) -> bool {
    match bf {
        BeliefFormula::Top => true,
        BeliefFormula::Fluent(lit) => {
            level.fluent_score(*lit) >= 0
                || (*lit == ef && vis <= 1)
                || (vis == 1 && *lit == ef.negate())
        }
        BeliefFormula::Not(_) => false,
        BeliefFormula::And(parts) => parts
            .iter()
            .all(|p| epistemic_upgrade(level, p, action, ef, vis)),
        BeliefFormula::Or(parts) => parts
            .iter()
            .any(|p| epistemic_upgrade(level, p, action, ef, vis)),
        BeliefFormula::Believes(agent, inner) => {
            match action.role_of(*agent, |f| level.holds(f)) {
                ObservedRole::Fully => epistemic_upgrade(level, inner, action, ef, 1),
                ObservedRole::Partially => epistemic_upgrade(level, inner, action, ef, 2),
                ObservedRole::Oblivious => false,
            }
        }
        BeliefFormula::Everyone(group, inner) | BeliefFormula::Common(group, inner) => {
            match role_of_group(level, action, group) {
                ObservedRole::Fully => epistemic_upgrade(level, inner, action, ef, 1),
                ObservedRole::Partially => epistemic_upgrade(level, inner, action, ef, 2),
                ObservedRole::Oblivious => false,
            }
        }
        BeliefFormula::Distributed(group, inner) => {
            let any_fully = group
                .iter()
                .any(|a| matches!(action.role_of(*a, |f| level.holds(f)), ObservedRole::Fully));
            let any_partially = group.iter().any(|a| {
                matches!(action.role_of(*a, |f| level.holds(f)), ObservedRole::Partially)
            });
            if any_fully {
                epistemic_upgrade(level, inner, action, ef, 1)
            } else if any_partially {
                epistemic_upgrade(level, inner, action, ef, 2)
            } else {
                false
            }
        }
    }
}

/// The layered relaxed-reachability structure itself.
pub struct PlanningGraph<'d> {
    domain: &'d Domain,
    goal: Vec<BeliefFormula>,
    universe: BTreeSet<BeliefFormula>,
    levels: Vec<StateLevel>,
    not_yet_executed: BTreeSet<ActionId>,
    action_levels: Vec<BTreeSet<ActionId>>,
    subgoal_depth: BTreeMap<BeliefFormula, i32>,
}

/// Outcome of running the graph to fixpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanningGraphOutcome {
    Satisfiable { depth: i32, sum: i32 },
    Unsatisfiable,
}

impl<'d> PlanningGraph<'d> {
    /// Build the initial level (depth 0) from a concrete start state.
    #[must_use]
    pub fn new(domain: &'d Domain, start: &KripkeState, goal: Vec<BeliefFormula>) -> Self {
        let mut universe = BTreeSet::new();
        for action in domain.actions.values() {
            collect_subformulas(&action.executability, &mut universe);
            for guard in action.effects.values() {
                collect_subformulas(guard, &mut universe);
            }
            for guard in action.fully_observants.values() {
                collect_subformulas(guard, &mut universe);
            }
            for guard in action.partially_observants.values() {
                collect_subformulas(guard, &mut universe);
            }
        }
        for g in &goal {
            collect_subformulas(g, &mut universe);
        }

        let mut fluent_universe = BTreeSet::new();
        for bf in &universe {
            collect_fluents(bf, &mut fluent_universe);
        }
        for action in domain.actions.values() {
            for formula in action.effects.keys() {
                if let Some(set) = formula.as_singleton() {
                    for lit in set.iter() {
                        fluent_universe.insert(lit);
                    }
                }
            }
        }

        let mut level0 = StateLevel::default();
        for lit in fluent_universe {
            if start.entails(&BeliefFormula::Fluent(lit)) {
                level0.fluents.insert(lit, 0);
            }
        }
        for bf in &universe {
            if start.entails(bf) {
                level0.beliefs.insert(bf.clone(), 0);
            }
        }

        let mut subgoal_depth = BTreeMap::new();
        for g in &goal {
            if level0.holds(g) {
                subgoal_depth.insert(g.clone(), 0);
            }
        }

        Self {
            domain,
            goal,
            universe,
            levels: vec![level0],
            not_yet_executed: domain.actions.keys().copied().collect(),
            action_levels: Vec::new(),
            subgoal_depth,
        }
    }

    fn current(&self) -> &StateLevel {
        self.levels.last().expect("at least level 0 exists")
    }

    fn goal_satisfied(&self) -> bool {
        self.goal.iter().all(|g| self.subgoal_depth.contains_key(g))
    }

    /// Expand one more layer. Returns `true` if anything new became true
    /// (a belief formula score moved from `-1`, or a new action became
    /// executable); `false` signals the fixpoint (no plan exists under the
    /// relaxation).
    fn expand(&mut self) -> bool {
        let depth = i32::try_from(self.levels.len()).unwrap_or(i32::MAX) - 1;
        let current = self.current().clone();

        let newly_executable: BTreeSet<ActionId> = self
            .not_yet_executed
            .iter()
            .filter(|id| {
                self.domain
                    .action(**id)
                    .is_some_and(|a| current.holds(&a.executability))
            })
            .copied()
            .collect();
        for id in &newly_executable {
            self.not_yet_executed.remove(id);
        }
        let mut action_level = newly_executable.clone();
        for prior in &self.action_levels {
            action_level.extend(prior.iter().copied());
        }

        let mut next = current.clone();
        let mut changed = !newly_executable.is_empty();

        for action_id in &action_level {
            let Some(action) = self.domain.action(*action_id) else {
                continue;
            };
            match action.kind {
                epistemic_kernel::action::ActionKind::Ontic => {
                    for (formula, guard) in &action.effects {
                        if !current.holds(guard) {
                            continue;
                        }
                        let Some(set) = formula.as_singleton() else {
                            continue;
                        };
                        for lit in set.iter() {
                            next.fluents.entry(lit).or_insert(depth + 1);
                        }
                    }
                    let false_beliefs: Vec<BeliefFormula> = self
                        .universe
                        .iter()
                        .filter(|bf| !current.holds(bf))
                        .cloned()
                        .collect();
                    for bf in false_beliefs {
                        if ontic_upgrade(&next, &bf, action) {
                            next.beliefs.entry(bf).or_insert_with(|| {
                                changed = true;
                                depth + 1
                            });
                        }
                    }
                }
                epistemic_kernel::action::ActionKind::Sensing
                | epistemic_kernel::action::ActionKind::Announcement => {
                    for (formula, guard) in &action.effects {
                        if !current.holds(guard) {
                            continue;
                        }
                        let Some(set) = formula.as_singleton() else {
                            continue;
                        };
                        let Some(ef) = set.iter().next() else {
                            continue;
                        };
                        let false_beliefs: Vec<BeliefFormula> = self
                            .universe
                            .iter()
                            .filter(|bf| !current.holds(bf))
                            .cloned()
                            .collect();
                        for bf in false_beliefs {
                            if epistemic_upgrade(&next, &bf, action, ef, 0) {
                                next.beliefs.entry(bf).or_insert_with(|| {
                                    changed = true;
                                    depth + 1
                                });
                            }
                        }
                    }
                }
                epistemic_kernel::action::ActionKind::NotSet => {}
            }
        }

        for g in &self.goal {
            if !self.subgoal_depth.contains_key(g) && next.holds(g) {
                self.subgoal_depth.insert(g.clone(), depth + 1);
            }
        }

        self.action_levels.push(action_level);
        self.levels.push(next);
        changed
    }

    /// Run expansion to a fixpoint, returning the planning-graph outcome.
    #[must_use]
    pub fn run(mut self) -> PlanningGraphOutcome {
        loop {
            if self.goal_satisfied() {
                let depth = self
                    .goal
                    .iter()
                    .map(|g| self.subgoal_depth[g])
                    .max()
                    .unwrap_or(0);
                let sum: i32 = self.goal.iter().map(|g| self.subgoal_depth[g]).sum();
                return PlanningGraphOutcome::Satisfiable { depth, sum };
            }
            if !self.expand() {
                return PlanningGraphOutcome::Unsatisfiable;
            }
            // Safety valve: more layers than there are actions times two
            // means the relaxation cannot possibly still be discovering
            // anything new; this only fires if `expand` mis-reports
            // `changed`, which would otherwise loop forever.
            if self.levels.len() > self.domain.actions.len() * 2 + 4 {
                return PlanningGraphOutcome::Unsatisfiable;
            }
        }
    }

    /// `C_PG`: a normalized inverse over the final level's scores, used as
    /// a cheap dense heuristic signal (spec.md §4.3). Higher is closer to
    /// fully-known; computed without running to a goal fixpoint.
    #[must_use]
    pub fn dense_progress_score(&self) -> i32 {
        let level = self.current();
        let known = level.fluents.values().filter(|&&v| v >= 0).count()
            + level.beliefs.values().filter(|&&v| v >= 0).count();
        let total = level.fluents.len() + level.beliefs.len();
        if total == 0 {
            0
        } else {
            i32::try_from(known * 1000 / total).unwrap_or(i32::MAX)
        }
    }
}

fn collect_fluents(bf: &BeliefFormula, out: &mut BTreeSet<Fluent>) {
    match bf {
        BeliefFormula::Top => {}
        BeliefFormula::Fluent(lit) => {
            out.insert(*lit);
        }
        BeliefFormula::Not(inner) => collect_fluents(inner, out),
        BeliefFormula::And(parts) | BeliefFormula::Or(parts) => {
            for p in parts {
                collect_fluents(p, out);
            }
        }
        BeliefFormula::Believes(_, inner)
        | BeliefFormula::Everyone(_, inner)
        | BeliefFormula::Common(_, inner)
        | BeliefFormula::Distributed(_, inner) => collect_fluents(inner, out),
    }
}

/// `SUBGOALS`: the cheap variant that never builds a planning graph -- just
/// counts goal-list formulae not entailed by a concrete state.
#[must_use]
pub fn count_unsatisfied_subgoals(state: &KripkeState, goal: &[BeliefFormula]) -> i32 {
    i32::try_from(goal.iter().filter(|g| !state.entails(g)).count()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use epistemic_kernel::action::{Action, ActionKind};
    use epistemic_kernel::bitset::{ActionId, FluentsSet};
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
    fn reaches_goal_in_one_layer() {
        let (domain, state) = one_action_domain();
        let goal = vec![domain.goal.clone()];
        let graph = PlanningGraph::new(&domain, &state, goal);
        match graph.run() {
            PlanningGraphOutcome::Satisfiable { depth, .. } => assert_eq!(depth, 1),
            PlanningGraphOutcome::Unsatisfiable => panic!("expected a plan"),
        }
    }

    #[test]
    fn subgoals_counts_unentailed_goals() {
        let (domain, state) = one_action_domain();
        let goal = vec![domain.goal.clone()];
        assert_eq!(count_unsatisfied_subgoals(&state, &goal), 1);
    }

    #[test]
    fn unreachable_goal_is_unsatisfiable() {
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("p");
        let _action_id = builder.register_action("noop");
        let grounder = builder.build();
        let goal = BeliefFormula::Fluent(Fluent::new(0, true));
        let domain = Domain::new(grounder, goal.clone(), 5);
        let store = Arc::new(KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();
        let graph = PlanningGraph::new(&domain, &state, vec![goal]);
        assert_eq!(graph.run(), PlanningGraphOutcome::Unsatisfiable);
    }
}
