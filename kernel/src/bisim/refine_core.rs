//! Shared fixpoint engine behind both [`super::paige_tarjan`] and
//! [`super::fast`]: repeated signature-based splitting of a block
//! partition until stable.
//!
//! [`super::paige_tarjan::refine`] and [`super::fast::refine`] differ only
//! in how they seed and order the splitting (global label partition run to
//! a single fixpoint, vs. a rank-ordered sequence of smaller fixpoints);
//! both converge to the same coarsest partition respecting the initial
//! per-node labels, since that partition is unique. This module holds the
//! one splitting primitive so the two entry points cannot drift apart.

use std::collections::{BTreeMap, BTreeSet};

use super::graph::LabelledGraph;
use crate::world::KripkeWorldPointer;

/// Split `blocks` (indices into `nodes`) against the edge structure of
/// `graph` until no block splits any further. Each input block is assumed
/// already internally consistent with whatever ordering constraint seeded
/// it (e.g. same label, or same rank); the fixpoint only ever refines
/// further, never merges.
pub(super) fn split_to_fixpoint(
    graph: &LabelledGraph,
    nodes: &[KripkeWorldPointer],
    node_index: &BTreeMap<KripkeWorldPointer, usize>,
    mut blocks: Vec<Vec<usize>>,
) -> Vec<Vec<usize>> {
    loop {
        let block_of: BTreeMap<usize, usize> = blocks
            .iter()
            .enumerate()
            .flat_map(|(b, members)| members.iter().map(move |&n| (n, b)))
            .collect();

        let mut next: Vec<Vec<usize>> = Vec::with_capacity(blocks.len());
        let mut split_happened = false;

        for block in &blocks {
            let mut by_signature: BTreeMap<Vec<BTreeSet<usize>>, Vec<usize>> = BTreeMap::new();
            for &n in block {
                let node = nodes[n];
                let sig: Vec<BTreeSet<usize>> = graph
                    .agents
                    .iter()
                    .map(|agent| {
                        graph
                            .targets(node, *agent)
                            .iter()
                            .map(|t| block_of[&node_index[t]])
                            .collect::<BTreeSet<usize>>()
                    })
                    .collect();
                by_signature.entry(sig).or_default().push(n);
            }
            if by_signature.len() > 1 {
                split_happened = true;
            }
            next.extend(by_signature.into_values());
        }

        blocks = next;
        if !split_happened {
            return blocks;
        }
    }
}

/// The result of a refinement: blocks of node indices, each mapped back to
/// the world pointers they represent. The first element of each block is
/// its representative (see [`super::quotient`]).
#[derive(Debug, Clone)]
pub struct Partition {
    pub blocks: Vec<Vec<KripkeWorldPointer>>,
}

pub(super) fn finish(nodes: &[KripkeWorldPointer], blocks: Vec<Vec<usize>>) -> Partition {
    Partition {
        blocks: blocks
            .into_iter()
            .map(|members| members.into_iter().map(|i| nodes[i]).collect())
            .collect(),
    }
}
