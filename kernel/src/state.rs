//! Pointed Kripke states: entailment, initial-state construction, and
//! action-update transitions.
//!
//! Grounded on `original_source/src/states/representations/kripke/KripkeState.h`.
//! The original's recursive `execute_ontic_helper`/
//! `execute_sensing_announcement_helper` transition-cache pattern is kept
//! conceptually as the `oblivious`/`fully`/`partially` partition done once
//! per update and a `TransitionCache` memoizing world-pointer rewrites.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::action::{Action, ObservedRole};
use crate::bitset::{Agent, FluentsSet};
use crate::domain::Domain;
use crate::error::KernelError;
use crate::formula::BeliefFormula;
use crate::world::{KripkeWorldPointer, KripkeWorldStore};

pub(crate) type Beliefs = BTreeMap<KripkeWorldPointer, BTreeMap<Agent, BTreeSet<KripkeWorldPointer>>>;

/// A pointed Kripke state: a set of worlds, per-agent accessibility
/// relations between them, a distinguished pointed world, and a repetition
/// bound (`max_depth`) used to keep the oblivious-reachable subgraph's
/// pointer tags from growing unboundedly across many updates.
#[derive(Debug, Clone)]
pub struct KripkeState {
    store: Arc<KripkeWorldStore>,
    worlds: BTreeSet<KripkeWorldPointer>,
    pointed: KripkeWorldPointer,
    beliefs: Beliefs,
    max_depth: u16,
}

impl KripkeState {
    #[must_use]
    pub fn store(&self) -> &Arc<KripkeWorldStore> {
        &self.store
    }

    #[must_use]
    pub fn worlds(&self) -> &BTreeSet<KripkeWorldPointer> {
        &self.worlds
    }

    #[must_use]
    pub fn pointed(&self) -> KripkeWorldPointer {
        self.pointed
    }

    #[must_use]
    pub fn max_depth(&self) -> u16 {
        self.max_depth
    }

    /// A stable total-order key derived from `(pointed, worlds, beliefs)`,
    /// used by the search crate's visited-set and priority-queue
    /// tie-breaking (spec's "Search state" comparison rule). Two states
    /// with this key equal are indistinguishable for search purposes: same
    /// pointed world, same world set, same accessibility relation.
    #[must_use]
    pub fn canonical_fingerprint(&self) -> crate::proof::hash::ContentHash {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.pointed.world_id_bits().to_be_bytes());
        bytes.extend_from_slice(&self.pointed.repetition().to_be_bytes());
        for w in &self.worlds {
            bytes.extend_from_slice(&w.world_id_bits().to_be_bytes());
            bytes.extend_from_slice(&w.repetition().to_be_bytes());
        }
        for (w, per_agent) in &self.beliefs {
            bytes.extend_from_slice(&w.world_id_bits().to_be_bytes());
            bytes.extend_from_slice(&w.repetition().to_be_bytes());
            for (agent, targets) in per_agent {
                bytes.extend_from_slice(&agent.0.to_be_bytes());
                for t in targets {
                    bytes.extend_from_slice(&t.world_id_bits().to_be_bytes());
                    bytes.extend_from_slice(&t.repetition().to_be_bytes());
                }
            }
        }
        crate::proof::hash::canonical_hash(crate::proof::hash::DOMAIN_SEARCH_STATE, &bytes)
    }

    /// Render this state's worlds and per-agent accessibility edges as a
    /// Graphviz DOT digraph, for `--execute`'s intermediate-state dump and
    /// the dataset dumper's per-visited-state graph files (SPEC_FULL.md §11
    /// supplemented feature: the original planner writes the same world/edge
    /// structure out for plan validation and GNN training data).
    ///
    /// Each world node is labelled with its fluent content; the pointed
    /// world is drawn as a doublecircle. Edges are labelled with the
    /// agent id whose accessibility relation they belong to.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph KripkeState {\n");
        for world in &self.worlds {
            let shape = if *world == self.pointed {
                "doublecircle"
            } else {
                "circle"
            };
            out.push_str(&format!(
                "  \"{}_{}\" [shape={shape}, label=\"{}\"];\n",
                world.world_id_bits(),
                world.repetition(),
                self.fluents_at(*world)
            ));
        }
        for (world, per_agent) in &self.beliefs {
            for (agent, targets) in per_agent {
                for target in targets {
                    out.push_str(&format!(
                        "  \"{}_{}\" -> \"{}_{}\" [label=\"{}\"];\n",
                        world.world_id_bits(),
                        world.repetition(),
                        target.world_id_bits(),
                        target.repetition(),
                        agent.0
                    ));
                }
            }
        }
        out.push_str("}\n");
        out
    }

    #[must_use]
    pub fn accessible(&self, world: KripkeWorldPointer, agent: Agent) -> BTreeSet<KripkeWorldPointer> {
        self.beliefs
            .get(&world)
            .and_then(|m| m.get(&agent))
            .cloned()
            .unwrap_or_default()
    }

    fn fluents_at(&self, world: KripkeWorldPointer) -> FluentsSet {
        self.store
            .get(world.world_id())
            .map(|w| w.fluents().clone())
            .unwrap_or_default()
    }

    // ---- entailment ----

    /// Evaluate `formula` at `world` within this state.
    #[must_use]
    pub fn entails_at(&self, world: KripkeWorldPointer, formula: &BeliefFormula) -> bool {
        match formula {
            BeliefFormula::Top => true,
            BeliefFormula::Fluent(lit) => {
                self.fluents_at(world).value_of(lit.id()) == Some(lit.is_positive())
            }
            BeliefFormula::Not(inner) => !self.entails_at(world, inner),
            BeliefFormula::And(parts) => parts.iter().all(|p| self.entails_at(world, p)),
            BeliefFormula::Or(parts) => parts.iter().any(|p| self.entails_at(world, p)),
            BeliefFormula::Believes(agent, inner) => self
                .accessible(world, *agent)
                .iter()
                .all(|w| self.entails_at(*w, inner)),
            BeliefFormula::Everyone(group, inner) => group
                .iter()
                .all(|a| self.entails_at(world, &BeliefFormula::believes(*a, (**inner).clone()))),
            BeliefFormula::Common(group, inner) => {
                self.common_reachable(world, group)
                    .iter()
                    .all(|w| self.entails_at(*w, inner))
            }
            BeliefFormula::Distributed(group, inner) => {
                let mut intersection: Option<BTreeSet<KripkeWorldPointer>> = None;
                for agent in group {
                    let reach = self.accessible(world, *agent);
                    intersection = Some(match intersection {
                        None => reach,
                        Some(prev) => prev.intersection(&reach).copied().collect(),
                    });
                }
                intersection
                    .unwrap_or_default()
                    .iter()
                    .all(|w| self.entails_at(*w, inner))
            }
        }
    }

    /// Entailment at the pointed world.
    #[must_use]
    pub fn entails(&self, formula: &BeliefFormula) -> bool {
        self.entails_at(self.pointed, formula)
    }

    /// Transitive closure of accessibility for `group` starting at `world`,
    /// including `world` itself (used for common-knowledge/-belief).
    fn common_reachable(
        &self,
        world: KripkeWorldPointer,
        group: &BTreeSet<Agent>,
    ) -> BTreeSet<KripkeWorldPointer> {
        let mut seen = BTreeSet::new();
        let mut frontier = vec![world];
        seen.insert(world);
        while let Some(w) = frontier.pop() {
            for agent in group {
                for next in self.accessible(w, *agent) {
                    if seen.insert(next) {
                        frontier.push(next);
                    }
                }
            }
        }
        seen
    }

    /// Is `action` executable at the pointed world?
    #[must_use]
    pub fn is_executable(&self, action: &Action) -> bool {
        self.entails(&action.executability)
    }

    // ---- initial-state construction ----

    /// Enumerate every consistent valuation of `fluent_count` fluents,
    /// discard those violating the domain's known initial facts, build a
    /// total initial accessibility relation per agent, then remove edges
    /// per the `C(G, B(a,f) or !B(a,f))` / `C(G, !B(a,f) and !B(a,!f))`
    /// initial-condition patterns so the remaining relation matches exactly
    /// what the declared initial beliefs require.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnsatisfiableInitialState`] if no world
    /// survives the known-fact filter.
    pub fn build_initial(
        store: Arc<KripkeWorldStore>,
        domain: &Domain,
        fluent_count: usize,
    ) -> Result<Self, KernelError> {
        use crate::bitset::Fluent;

        let mut candidate_sets = Vec::new();
        for mask in 0u64..(1u64 << fluent_count) {
            let literals: Vec<Fluent> = (0..fluent_count)
                .map(|i| Fluent::new(i as u32, mask & (1 << i) != 0))
                .collect();
            if let Some(set) = FluentsSet::try_from_literals(literals) {
                candidate_sets.push(set);
            }
        }

        // Discard valuations inconsistent with known propositional facts.
        let surviving: Vec<FluentsSet> = candidate_sets
            .into_iter()
            .filter(|set| {
                domain
                    .initial
                    .known_facts
                    .iter()
                    .all(|fact| fact_holds(fact, set))
            })
            .collect();

        if surviving.is_empty() {
            return Err(KernelError::UnsatisfiableInitialState);
        }

        let mut pointers = Vec::new();
        for set in &surviving {
            let id = store.intern(set.clone());
            pointers.push(KripkeWorldPointer::new(id, 0));
        }
        pointers.sort();
        pointers.dedup();

        // Total initial accessibility for every agent.
        let mut beliefs: Beliefs = BTreeMap::new();
        for &w in &pointers {
            let mut per_agent = BTreeMap::new();
            for agent in domain.agents() {
                per_agent.insert(agent, pointers.iter().copied().collect());
            }
            beliefs.insert(w, per_agent);
        }

        let pointed = *pointers.first().expect("non-empty after filter");

        let mut state = Self {
            store,
            worlds: pointers.into_iter().collect(),
            pointed,
            beliefs,
            max_depth: domain.max_depth,
        };

        // Pick out the pointed world: the first surviving world that also
        // satisfies every nested belief fact (B/E/C/D), if any such facts
        // are declared; otherwise keep the first enumerated world.
        if !domain.initial.belief_facts.is_empty() {
            if let Some(&chosen) = state
                .worlds
                .iter()
                .find(|w| domain.initial.belief_facts.iter().all(|f| state.entails_at(**w, f)))
            {
                state.pointed = chosen;
            }
        }

        // Narrow accessibility per the declared belief facts. A `C(G, f)`
        // style fact restricts which worlds stay reachable for members of
        // G; we implement this as: remove edge (w -> w') for agent a in G
        // whenever w' is inconsistent with a fact nested under B(a, ...)
        // in the declared belief_facts.
        for fact in &domain.initial.belief_facts {
            apply_initial_belief_restriction(&mut state.beliefs, fact, &state.worlds, |w| {
                state.store.get(w.world_id()).map(|k| k.fluents().clone()).unwrap_or_default()
            });
        }

        Ok(state)
    }

    // ---- action update ----

    /// Transition this state through `action`, producing the successor
    /// pointed state.
    ///
    /// Ontic actions partition worlds into fully-observant (belief changes,
    /// new worlds minted with the effect applied) and oblivious (subgraph
    /// carried over unchanged, `max_depth` bumped). Sensing/announcement
    /// actions additionally recognize a partially-observant role: such
    /// agents keep every edge regardless of the sensed truth value, while
    /// fully-observant agents keep an edge only when both endpoints agree
    /// on the sensed fluent's truth value.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnsatisfiableExecutability`] if `action` is
    /// not executable at the pointed world.
    pub fn apply_action(&self, action: &Action) -> Result<Self, KernelError> {
        if !self.is_executable(action) {
            return Err(KernelError::UnsatisfiableExecutability {
                action: format!("{:?}", action.id),
            });
        }

        match action.kind {
            crate::action::ActionKind::Ontic => Ok(self.apply_ontic(action)),
            crate::action::ActionKind::Sensing | crate::action::ActionKind::Announcement => {
                Ok(self.apply_epistemic(action))
            }
            crate::action::ActionKind::NotSet => Err(KernelError::UnsatisfiableExecutability {
                action: format!("{:?}", action.id),
            }),
        }
    }

    /// Partition every agent in use into role buckets by evaluating
    /// `action`'s observability guards once, at `world` -- per spec.md
    /// §4.1 ("partition agents into fully/oblivious") and the original's
    /// `FormulaHelper::get_agents_if_entailed(map, *this)`, which evaluates
    /// the guard against the whole state's pointed world, not per
    /// destination world reached during the transition recursion.
    fn partition_roles(
        &self,
        action: &Action,
        world: KripkeWorldPointer,
    ) -> BTreeMap<Agent, ObservedRole> {
        let entails = |f: &BeliefFormula| self.entails_at(world, f);
        self.domain_agents()
            .map(|agent| (agent, action.role_of(agent, entails)))
            .collect()
    }

    fn world_satisfies(&self, world: KripkeWorldPointer, effect: &FluentsSet) -> bool {
        self.fluents_at(world).is_superset_of(effect)
    }

    fn apply_ontic(&self, action: &Action) -> Self {
        let effect = action.effect_set(|f| self.entails_at(self.pointed, f));
        let roles = self.partition_roles(action, self.pointed);
        let fully_agents: BTreeSet<Agent> = roles
            .iter()
            .filter(|(_, r)| **r == ObservedRole::Fully)
            .map(|(a, _)| *a)
            .collect();
        let oblivious_agents: BTreeSet<Agent> = roles
            .iter()
            .filter(|(_, r)| **r != ObservedRole::Fully)
            .map(|(a, _)| *a)
            .collect();

        // Worlds reachable from pointed via fully-observant agents only get
        // a minted, effect-applied copy; pointed itself is always among
        // them (the real world changes regardless of who witnesses it).
        let fully_reach = self.common_reachable(self.pointed, &fully_agents);
        // Worlds an oblivious agent still considers possible are carried
        // over unchanged, as if the action never happened for them.
        let oblivious_reach = if oblivious_agents.is_empty() {
            BTreeSet::new()
        } else {
            self.common_reachable(self.pointed, &oblivious_agents)
        };

        // Bump the repetition bound before minting, then tag every minted
        // world with `max_depth + old_repetition` (the original's
        // `add_rep_world(world, get_max_depth() + old_repetition)`), not the
        // bare source repetition. Otherwise a world reachable through both
        // the fully-observant cone and the oblivious-carried subgraph (e.g.
        // `pointed` itself) would mint a pointer byte-identical to the
        // carried-over copy, collapsing the two branches prematurely.
        let max_depth = if oblivious_agents.is_empty() {
            self.max_depth
        } else {
            self.max_depth + 1
        };

        let mut rewrite: BTreeMap<KripkeWorldPointer, KripkeWorldPointer> = BTreeMap::new();
        let mut new_worlds: BTreeSet<KripkeWorldPointer> = oblivious_reach.iter().copied().collect();
        for &w in &fully_reach {
            let updated = self.fluents_at(w).with_overwritten(&effect);
            let id = self.store.intern(updated);
            let w2 = KripkeWorldPointer::new(id, max_depth + w.repetition());
            rewrite.insert(w, w2);
            new_worlds.insert(w2);
        }

        let mut new_beliefs: Beliefs = BTreeMap::new();
        for &w in &oblivious_reach {
            let mut per_agent = BTreeMap::new();
            for agent in self.domain_agents() {
                let mapped: BTreeSet<KripkeWorldPointer> = self
                    .accessible(w, agent)
                    .into_iter()
                    .filter(|t| new_worlds.contains(t))
                    .collect();
                per_agent.insert(agent, mapped);
            }
            new_beliefs.insert(w, per_agent);
        }
        for &w in &fully_reach {
            let w2 = rewrite[&w];
            let mut per_agent = BTreeMap::new();
            for agent in self.domain_agents() {
                let targets = self.accessible(w, agent);
                let mapped: BTreeSet<KripkeWorldPointer> = if fully_agents.contains(&agent) {
                    targets.iter().filter_map(|t| rewrite.get(t).copied()).collect()
                } else {
                    targets.into_iter().filter(|t| oblivious_reach.contains(t)).collect()
                };
                per_agent.insert(agent, mapped);
            }
            new_beliefs.insert(w2, per_agent);
        }

        let pointed = rewrite
            .get(&self.pointed)
            .copied()
            .unwrap_or(self.pointed);

        Self {
            store: Arc::clone(&self.store),
            pointed,
            worlds: new_worlds,
            beliefs: new_beliefs,
            max_depth,
        }
    }

    fn apply_epistemic(&self, action: &Action) -> Self {
        let ef = action.effect_set(|f| self.entails_at(self.pointed, f));
        let roles = self.partition_roles(action, self.pointed);
        let fully_agents: BTreeSet<Agent> = roles
            .iter()
            .filter(|(_, r)| **r == ObservedRole::Fully)
            .map(|(a, _)| *a)
            .collect();
        let partially_agents: BTreeSet<Agent> = roles
            .iter()
            .filter(|(_, r)| **r == ObservedRole::Partially)
            .map(|(a, _)| *a)
            .collect();
        let oblivious_agents: BTreeSet<Agent> = roles
            .iter()
            .filter(|(_, r)| **r == ObservedRole::Oblivious)
            .map(|(a, _)| *a)
            .collect();
        let observed_agents: BTreeSet<Agent> =
            fully_agents.union(&partially_agents).copied().collect();

        // Worlds reached via a fully- or partially-observant-labelled edge
        // form the "full/partial cone": minted with the same fluents (the
        // action doesn't change the world) but a repetition tag offset by
        // the bumped `max_depth`, same as `apply_ontic` -- reusing the bare
        // source repetition would make the minted pointer byte-identical to
        // a world also reachable through the oblivious-carried subgraph
        // (e.g. `pointed`), collapsing the two branches the tag exists to
        // keep apart.
        let observed_reach = self.common_reachable(self.pointed, &observed_agents);
        let oblivious_reach = if oblivious_agents.is_empty() {
            BTreeSet::new()
        } else {
            self.common_reachable(self.pointed, &oblivious_agents)
        };
        let max_depth = if oblivious_agents.is_empty() {
            self.max_depth
        } else {
            self.max_depth + 1
        };

        let mut rewrite: BTreeMap<KripkeWorldPointer, KripkeWorldPointer> = BTreeMap::new();
        let mut new_worlds: BTreeSet<KripkeWorldPointer> = oblivious_reach.iter().copied().collect();
        for &w in &observed_reach {
            let id = self.store.intern(self.fluents_at(w));
            let w2 = KripkeWorldPointer::new(id, max_depth + w.repetition());
            rewrite.insert(w, w2);
            new_worlds.insert(w2);
        }

        let mut new_beliefs: Beliefs = BTreeMap::new();
        for &w in &oblivious_reach {
            let mut per_agent = BTreeMap::new();
            for agent in self.domain_agents() {
                let mapped: BTreeSet<KripkeWorldPointer> = self
                    .accessible(w, agent)
                    .into_iter()
                    .filter(|t| new_worlds.contains(t))
                    .collect();
                per_agent.insert(agent, mapped);
            }
            new_beliefs.insert(w, per_agent);
        }
        for &w in &observed_reach {
            let w2 = rewrite[&w];
            let mut per_agent = BTreeMap::new();
            for agent in self.domain_agents() {
                let targets = self.accessible(w, agent);
                let mapped: BTreeSet<KripkeWorldPointer> = if fully_agents.contains(&agent) {
                    let w_sensed = self.world_satisfies(w, &ef);
                    targets
                        .iter()
                        .filter(|t| self.world_satisfies(**t, &ef) == w_sensed)
                        .filter_map(|t| rewrite.get(t).copied())
                        .collect()
                } else if partially_agents.contains(&agent) {
                    targets.iter().filter_map(|t| rewrite.get(t).copied()).collect()
                } else {
                    targets.into_iter().filter(|t| oblivious_reach.contains(t)).collect()
                };
                per_agent.insert(agent, mapped);
            }
            new_beliefs.insert(w2, per_agent);
        }

        let pointed = rewrite
            .get(&self.pointed)
            .copied()
            .unwrap_or(self.pointed);

        Self {
            store: Arc::clone(&self.store),
            pointed,
            worlds: new_worlds,
            beliefs: new_beliefs,
            max_depth,
        }
    }

    fn domain_agents(&self) -> impl Iterator<Item = Agent> + '_ {
        self.beliefs
            .values()
            .flat_map(|m| m.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
    }

    /// Every agent with at least one recorded accessibility entry in this
    /// state. Used by [`crate::bisim`] to build its labelled-graph encoding
    /// without needing a `Domain` reference.
    #[must_use]
    pub fn agents_in_use(&self) -> BTreeSet<Agent> {
        self.domain_agents().collect()
    }

    /// Rebuild a state from its constituent parts. Used by
    /// [`crate::bisim::quotient`] to reconstruct the contracted state after
    /// partition refinement; not a general public constructor since callers
    /// outside the crate have no way to produce a well-formed `Beliefs` map.
    #[must_use]
    pub(crate) fn from_parts(
        store: Arc<KripkeWorldStore>,
        worlds: BTreeSet<KripkeWorldPointer>,
        pointed: KripkeWorldPointer,
        beliefs: Beliefs,
        max_depth: u16,
    ) -> Self {
        Self {
            store,
            worlds,
            pointed,
            beliefs,
            max_depth,
        }
    }
}

fn fact_holds(fact: &BeliefFormula, set: &FluentsSet) -> bool {
    match fact {
        BeliefFormula::Top => true,
        BeliefFormula::Fluent(lit) => set.value_of(lit.id()) == Some(lit.is_positive()),
        BeliefFormula::Not(inner) => !fact_holds(inner, set),
        BeliefFormula::And(parts) => parts.iter().all(|p| fact_holds(p, set)),
        BeliefFormula::Or(parts) => parts.iter().any(|p| fact_holds(p, set)),
        // Nested belief facts are handled by build_initial's second pass,
        // not here; treat as vacuously true for the propositional filter.
        _ => true,
    }
}

fn apply_initial_belief_restriction(
    beliefs: &mut Beliefs,
    fact: &BeliefFormula,
    worlds: &BTreeSet<KripkeWorldPointer>,
    fluents_of: impl Fn(KripkeWorldPointer) -> FluentsSet,
) {
    // `C(G, B(a, f) or !B(a, f))` / `C(G, !B(a,f) and !B(a,!f))`: for the
    // named agent(s), remove edges leading to worlds inconsistent with the
    // nested fact so later entailment of B(a, f) matches the declaration.
    if let BeliefFormula::Common(_, inner) = fact {
        if let BeliefFormula::Believes(agent, nested) = inner.as_ref() {
            if let BeliefFormula::Fluent(lit) = nested.as_ref() {
                for w in worlds {
                    if let Some(per_agent) = beliefs.get_mut(w) {
                        if let Some(reach) = per_agent.get_mut(agent) {
                            reach.retain(|w2| {
                                fluents_of(*w2).value_of(lit.id()) == Some(lit.is_positive())
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionKind};
    use crate::bitset::{Agent, ActionId, Fluent};
    use crate::domain::Domain;
    use crate::formula::FluentFormula;
    use crate::grounder::GrounderBuilder;

    fn two_fluent_domain() -> (Arc<KripkeWorldStore>, Domain) {
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("p");
        builder.register_fluent("q");
        builder.register_agent("a");
        let grounder = builder.build();
        let domain = Domain::new(grounder, BeliefFormula::Top, 10);
        (Arc::new(KripkeWorldStore::new()), domain)
    }

    #[test]
    fn build_initial_enumerates_consistent_worlds() {
        let (store, domain) = two_fluent_domain();
        let state = KripkeState::build_initial(store, &domain, 2).unwrap();
        assert_eq!(state.worlds().len(), 4);
    }

    #[test]
    fn build_initial_filters_known_facts() {
        let (store, mut domain) = two_fluent_domain();
        domain.initial.push(BeliefFormula::Fluent(Fluent::new(0, true)));
        let state = KripkeState::build_initial(store, &domain, 2).unwrap();
        assert_eq!(state.worlds().len(), 2);
        assert!(state.entails(&BeliefFormula::Fluent(Fluent::new(0, true))));
    }

    #[test]
    fn ontic_action_updates_pointed_world() {
        let (store, domain) = two_fluent_domain();
        let state = KripkeState::build_initial(store, &domain, 2).unwrap();
        let effect = FluentFormula::from_singleton(
            FluentsSet::try_from_literals([Fluent::new(0, true)]).unwrap(),
        );
        let mut action = Action::new(ActionId(0), ActionKind::Ontic, BeliefFormula::Top);
        action.effects.insert(effect, BeliefFormula::Top);
        let next = state.apply_action(&action).unwrap();
        assert!(next.entails(&BeliefFormula::Fluent(Fluent::new(0, true))));
    }

    #[test]
    fn unexecutable_action_errors() {
        let (store, domain) = two_fluent_domain();
        let state = KripkeState::build_initial(store, &domain, 2).unwrap();
        let action = Action::new(
            ActionId(0),
            ActionKind::Ontic,
            BeliefFormula::not(BeliefFormula::Top),
        );
        assert!(state.apply_action(&action).is_err());
    }

    #[test]
    fn sensing_action_splits_accessibility_by_truth_value() {
        let (store, domain) = two_fluent_domain();
        let state = KripkeState::build_initial(store, &domain, 2).unwrap();
        let agent = Agent(0);
        let mut action = Action::new(ActionId(0), ActionKind::Sensing, BeliefFormula::Top);
        action
            .fully_observants
            .insert(agent, BeliefFormula::Top);
        let next = state.apply_action(&action).unwrap();
        // After a fully-observed sensing action with no effect, the
        // pointed world's accessible set for the agent contains only
        // worlds agreeing with it on every sensed fluent -- trivially true
        // here since the action has no effect map, so nothing is sensed
        // and all worlds remain mutually accessible.
        assert!(!next.accessible(next.pointed(), agent).is_empty());
    }

    #[test]
    fn to_dot_marks_pointed_world_and_emits_edges() {
        let (store, domain) = two_fluent_domain();
        let state = KripkeState::build_initial(store, &domain, 2).unwrap();
        let dot = state.to_dot();
        assert!(dot.starts_with("digraph KripkeState {"));
        assert!(dot.contains("doublecircle"));
    }
}
