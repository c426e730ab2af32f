//! Labelled-state/labelled-edge graph encoding of a [`KripkeState`] used as
//! the common input to both partition-refinement algorithms.
//!
//! Each world's intrinsic label is its fluent content (so two worlds with
//! different valuations can never land in the same block); each
//! accessibility edge is labelled by the observing agent.

use std::collections::BTreeMap;

use crate::bitset::{Agent, FluentsSet};
use crate::state::KripkeState;
use crate::world::KripkeWorldPointer;

/// A graph node: one world pointer from the source state, with its
/// intrinsic fluent label and its outgoing labelled edges.
#[derive(Debug, Clone)]
pub struct LabelledGraph {
    pub nodes: Vec<KripkeWorldPointer>,
    pub labels: BTreeMap<KripkeWorldPointer, FluentsSet>,
    /// (source, agent) -> targets.
    pub edges: BTreeMap<(KripkeWorldPointer, Agent), Vec<KripkeWorldPointer>>,
    pub agents: Vec<Agent>,
}

impl LabelledGraph {
    /// Encode `state` as a labelled graph. `agents` is the full agent set
    /// to probe for accessibility edges; callers normally pass
    /// `state.agents_in_use()` or `Domain::agents()`.
    #[must_use]
    pub fn from_state(state: &KripkeState, agents: &[Agent]) -> Self {
        let nodes: Vec<KripkeWorldPointer> = state.worlds().iter().copied().collect();
        let mut labels = BTreeMap::new();
        for &w in &nodes {
            let fluents = state
                .store()
                .get(w.world_id())
                .map(|k| k.fluents().clone())
                .unwrap_or_default();
            labels.insert(w, fluents);
        }

        let mut agents_set = std::collections::BTreeSet::new();
        let mut edges = BTreeMap::new();
        for &w in &nodes {
            for &agent in agents {
                let targets: Vec<KripkeWorldPointer> =
                    state.accessible(w, agent).into_iter().collect();
                if !targets.is_empty() {
                    agents_set.insert(agent);
                    edges.insert((w, agent), targets);
                }
            }
        }

        Self {
            nodes,
            labels,
            edges,
            agents: agents_set.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn targets(&self, node: KripkeWorldPointer, agent: Agent) -> &[KripkeWorldPointer] {
        self.edges
            .get(&(node, agent))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
