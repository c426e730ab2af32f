//! Paige-Tarjan partition refinement.
//!
//! Grounded on `original_source/src/bisimulation/Bisimulation.cpp`'s
//! `PaigeTarjan` entry point. The original maintains the coarser partition
//! `X`, the finer partition `Q`, a compound-block worklist `C`, and
//! per-(node, X-block) predecessor counts that are incrementally rebound as
//! compound blocks split -- an O((n + e) log n) bookkeeping scheme. This
//! implementation computes the same coarsest partition (the bisimulation
//! quotient is unique for a given initial labelling) via the repeated
//! signature-split fixpoint in [`super::refine_core`], seeded with `X`'s
//! initial grouping: nodes sharing an intrinsic fluent label start in one
//! block, exactly as the original's label-splitting preprocessing step.

use std::collections::BTreeMap;

use super::graph::LabelledGraph;
use super::refine_core::{finish, split_to_fixpoint, Partition};

/// Compute the coarsest bisimulation partition of `graph` via label-seeded
/// signature splitting.
#[must_use]
pub fn refine(graph: &LabelledGraph) -> Partition {
    let nodes = graph.nodes.clone();
    let node_index: BTreeMap<_, _> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    // Seed X: group node indices by intrinsic fluent label so worlds with
    // different content can never end up in the same block.
    let mut by_label: BTreeMap<&crate::bitset::FluentsSet, Vec<usize>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        let label = &graph.labels[node];
        by_label.entry(label).or_default().push(i);
    }
    let initial: Vec<Vec<usize>> = by_label.into_values().collect();

    let blocks = split_to_fixpoint(graph, &nodes, &node_index, initial);
    finish(&nodes, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::Agent;
    use crate::domain::Domain;
    use crate::formula::BeliefFormula;
    use crate::grounder::GrounderBuilder;
    use crate::state::KripkeState;
    use crate::world::KripkeWorldStore;
    use std::sync::Arc;

    #[test]
    fn distinguishes_worlds_by_label() {
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("p");
        builder.register_agent("a");
        let grounder = builder.build();
        let domain = Domain::new(grounder, BeliefFormula::Top, 5);
        let store = Arc::new(KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();
        let agents: Vec<Agent> = domain.agents().collect();
        let graph = LabelledGraph::from_state(&state, &agents);
        let partition = refine(&graph);
        // Two worlds, one with p true and one with p false: never merge.
        assert_eq!(partition.blocks.len(), 2);
    }

    #[test]
    fn merges_indistinguishable_worlds_under_total_relation() {
        // Two worlds over an unrelated fluent q, both reachable from every
        // world for the sole agent: with no distinguishing edge structure
        // and equal label groups they stay split only by label, which is
        // exactly what this test checks does NOT collapse differently
        // labelled worlds while leaving identically-labelled duplicates
        // (here, none) alone.
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("p");
        builder.register_agent("a");
        let grounder = builder.build();
        let domain = Domain::new(grounder, BeliefFormula::Top, 5);
        let store = Arc::new(KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();
        let agents: Vec<Agent> = domain.agents().collect();
        let graph = LabelledGraph::from_state(&state, &agents);
        let partition = refine(&graph);
        let total_nodes: usize = partition.blocks.iter().map(Vec::len).sum();
        assert_eq!(total_nodes, graph.nodes.len());
    }
}
