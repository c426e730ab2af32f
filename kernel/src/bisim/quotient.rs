//! Quotient reconstruction: collapse each bisimulation block to its
//! representative and rebuild a [`KripkeState`].
//!
//! Grounded on `original_source/src/bisimulation/Bisimulation.cpp`'s
//! quotient-building tail end ("mark each block's first node as the
//! representative... redirect every surviving edge... decode back to the
//! state form").

use std::collections::BTreeMap;

use super::refine_core::Partition;
use crate::state::KripkeState;
use crate::world::KripkeWorldPointer;

/// Rebuild `state` from a partition computed over its labelled-graph
/// encoding. Each block collapses to its first member; every edge is
/// redirected to the representative of its endpoints' blocks.
#[must_use]
pub fn rebuild(
    state: &KripkeState,
    agents: &[crate::bitset::Agent],
    partition: &Partition,
) -> KripkeState {
    let mut representative_of: BTreeMap<KripkeWorldPointer, KripkeWorldPointer> = BTreeMap::new();
    for block in &partition.blocks {
        let representative = *block
            .first()
            .expect("bisimulation block must be non-empty");
        for &member in block {
            representative_of.insert(member, representative);
        }
    }

    let new_worlds: std::collections::BTreeSet<KripkeWorldPointer> =
        representative_of.values().copied().collect();

    let mut new_beliefs: crate::state::Beliefs = BTreeMap::new();
    for block in &partition.blocks {
        let representative = *block.first().expect("non-empty block");
        let mut per_agent = BTreeMap::new();
        for &agent in agents {
            let targets: std::collections::BTreeSet<KripkeWorldPointer> = state
                .accessible(representative, agent)
                .iter()
                .map(|w| representative_of[w])
                .collect();
            per_agent.insert(agent, targets);
        }
        new_beliefs.insert(representative, per_agent);
    }

    let new_pointed = representative_of
        .get(&state.pointed())
        .copied()
        .unwrap_or_else(|| state.pointed());

    KripkeState::from_parts(
        std::sync::Arc::clone(state.store()),
        new_worlds,
        new_pointed,
        new_beliefs,
        state.max_depth(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bisim::graph::LabelledGraph;
    use crate::bisim::paige_tarjan;
    use crate::bitset::Agent;
    use crate::domain::Domain;
    use crate::formula::BeliefFormula;
    use crate::grounder::GrounderBuilder;
    use crate::world::KripkeWorldStore;
    use std::sync::Arc;

    #[test]
    fn rebuild_preserves_entailment_of_goal() {
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("p");
        builder.register_agent("a");
        let grounder = builder.build();
        let goal = BeliefFormula::Fluent(crate::bitset::Fluent::new(0, true));
        let domain = Domain::new(grounder, goal.clone(), 5);
        let store = Arc::new(KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();
        let agents: Vec<Agent> = domain.agents().collect();
        let graph = LabelledGraph::from_state(&state, &agents);
        let partition = paige_tarjan::refine(&graph);
        let contracted = rebuild(&state, &agents, &partition);
        assert_eq!(state.entails(&goal), contracted.entails(&goal));
        assert!(contracted.worlds().len() <= state.worlds().len());
    }
}
