//! Training-dataset dump: per visited state, a pair of DOT files (hashed
//! and name-mapped world graphs), plus one DOT file per run describing the
//! goal-formula tree (spec.md §6 "Dataset dump"). Consumed externally to
//! train the GNN heuristic's model, never read back by this crate.
//!
//! Grounded on `original_source/src/heuristics/` (the planner's own
//! training-data export, which walks the same world/edge structure
//! [`gnn`] reads back scores from) and on
//! [`epistemic_kernel::state::KripkeState::to_dot`] for the hashed form.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use epistemic_kernel::domain::Domain;
use epistemic_kernel::formula::BeliefFormula;
use epistemic_kernel::state::KripkeState;

use crate::error::HarnessError;

/// Assigns monotonically increasing indices to visited states within one
/// run and writes their paired DOT dumps under `dir`.
pub struct DatasetDumper {
    dir: PathBuf,
    counter: AtomicU64,
}

impl DatasetDumper {
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] if `dir` cannot be created.
    pub fn new(dir: PathBuf) -> Result<Self, HarnessError> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            counter: AtomicU64::new(0),
        })
    }

    /// Write the hashed and name-mapped DOT files for one visited state,
    /// returning the index assigned to it.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] if either file cannot be written.
    pub fn dump_state(&self, domain: &Domain, state: &KripkeState) -> Result<u64, HarnessError> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed);
        fs::write(self.hashed_path(index), state.to_dot())?;
        fs::write(self.mapped_path(index), to_dot_mapped(domain, state))?;
        Ok(index)
    }

    /// Write the goal-formula tree once per run.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] if the file cannot be written.
    pub fn dump_goal_tree(&self, domain: &Domain, goal: &BeliefFormula) -> Result<PathBuf, HarnessError> {
        let path = self.dir.join("goal_tree.dot");
        fs::write(&path, goal_formula_to_dot(domain, goal))?;
        Ok(path)
    }

    fn hashed_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("state_{index}_hashed.dot"))
    }

    fn mapped_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("state_{index}_mapped.dot"))
    }
}

/// Render `state` the way [`KripkeState::to_dot`] does, but with world
/// labels spelled out as declared fluent names via `domain`'s grounder
/// instead of raw bitset ids, and edges labelled with agent names. Built
/// directly from the same public traversal `to_dot` uses rather than by
/// post-processing its text, since fluent/agent ids can collide with
/// unrelated substrings (world ids, repetition counters) in the hashed
/// form.
#[must_use]
pub fn to_dot_mapped(domain: &Domain, state: &KripkeState) -> String {
    let mut out = String::from("digraph KripkeState {\n");
    let pointed = state.pointed();
    for world in state.worlds() {
        let shape = if *world == pointed { "doublecircle" } else { "circle" };
        let fluents = state
            .store()
            .get(world.world_id())
            .map(|k| k.fluents().clone())
            .unwrap_or_default();
        let label = fluents
            .iter()
            .map(|lit| {
                let name = domain.grounder.fluent_name(lit.id()).unwrap_or("?");
                if lit.is_positive() {
                    name.to_string()
                } else {
                    format!("!{name}")
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&format!(
            "  \"{}_{}\" [shape={shape}, label=\"{label}\"];\n",
            world.world_id_bits(),
            world.repetition()
        ));
    }
    for world in state.worlds() {
        for agent in domain.agents() {
            for target in state.accessible(*world, agent) {
                let name = domain.grounder.agent_name(agent).unwrap_or("?");
                out.push_str(&format!(
                    "  \"{}_{}\" -> \"{}_{}\" [label=\"{name}\"];\n",
                    world.world_id_bits(),
                    world.repetition(),
                    target.world_id_bits(),
                    target.repetition()
                ));
            }
        }
    }
    out.push_str("}\n");
    out
}

/// Render a belief formula as a Graphviz DOT tree: one node per subformula,
/// parent-child edges following the AST.
#[must_use]
pub fn goal_formula_to_dot(domain: &Domain, goal: &BeliefFormula) -> String {
    let mut out = String::from("digraph GoalFormula {\n");
    let mut next_id = 0u64;
    emit_formula_node(domain, goal, &mut next_id, &mut out);
    out.push_str("}\n");
    out
}

fn emit_formula_node(domain: &Domain, formula: &BeliefFormula, next_id: &mut u64, out: &mut String) -> u64 {
    let id = *next_id;
    *next_id += 1;
    let label = node_label(domain, formula);
    out.push_str(&format!("  n{id} [label=\"{label}\"];\n"));
    for child in children(formula) {
        let child_id = emit_formula_node(domain, child, next_id, out);
        out.push_str(&format!("  n{id} -> n{child_id};\n"));
    }
    id
}

fn node_label(domain: &Domain, formula: &BeliefFormula) -> String {
    match formula {
        BeliefFormula::Top => "TOP".to_string(),
        BeliefFormula::Fluent(f) => {
            let name = domain.grounder.fluent_name(f.id()).unwrap_or("?");
            if f.is_positive() {
                name.to_string()
            } else {
                format!("!{name}")
            }
        }
        BeliefFormula::Not(_) => "NOT".to_string(),
        BeliefFormula::And(_) => "AND".to_string(),
        BeliefFormula::Or(_) => "OR".to_string(),
        BeliefFormula::Believes(agent, _) => {
            format!("B({})", domain.grounder.agent_name(*agent).unwrap_or("?"))
        }
        BeliefFormula::Everyone(group, _) => format!("E({})", group_label(domain, group)),
        BeliefFormula::Common(group, _) => format!("C({})", group_label(domain, group)),
        BeliefFormula::Distributed(group, _) => format!("D({})", group_label(domain, group)),
    }
}

fn group_label(domain: &Domain, group: &std::collections::BTreeSet<epistemic_kernel::bitset::Agent>) -> String {
    group
        .iter()
        .map(|a| domain.grounder.agent_name(*a).unwrap_or("?"))
        .collect::<Vec<_>>()
        .join(",")
}

fn children(formula: &BeliefFormula) -> Vec<&BeliefFormula> {
    match formula {
        BeliefFormula::Top | BeliefFormula::Fluent(_) => Vec::new(),
        BeliefFormula::Not(inner) => vec![inner.as_ref()],
        BeliefFormula::And(parts) | BeliefFormula::Or(parts) => parts.iter().collect(),
        BeliefFormula::Believes(_, inner)
        | BeliefFormula::Everyone(_, inner)
        | BeliefFormula::Common(_, inner)
        | BeliefFormula::Distributed(_, inner) => vec![inner.as_ref()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epistemic_kernel::bitset::Fluent;
    use epistemic_kernel::grounder::GrounderBuilder;
    use epistemic_kernel::world::KripkeWorldStore;
    use std::sync::Arc;

    fn sample_domain() -> (Domain, KripkeState) {
        let mut builder = GrounderBuilder::new();
        builder.register_fluent("heads");
        builder.register_agent("alice");
        let grounder = builder.build();
        let goal = BeliefFormula::believes(
            epistemic_kernel::bitset::Agent(0),
            BeliefFormula::Fluent(Fluent::new(0, true)),
        );
        let domain = Domain::new(grounder, goal, 5);
        let store = Arc::new(KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();
        (domain, state)
    }

    #[test]
    fn dumps_hashed_and_mapped_files_with_increasing_index() {
        let (domain, state) = sample_domain();
        let dir = tempfile::tempdir().unwrap();
        let dumper = DatasetDumper::new(dir.path().to_path_buf()).unwrap();
        let first = dumper.dump_state(&domain, &state).unwrap();
        let second = dumper.dump_state(&domain, &state).unwrap();
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert!(dir.path().join("state_0_hashed.dot").exists());
        assert!(dir.path().join("state_0_mapped.dot").exists());
        assert!(dir.path().join("state_1_hashed.dot").exists());
    }

    #[test]
    fn mapped_dot_replaces_fluent_ids_with_names() {
        let (domain, state) = sample_domain();
        let mapped = to_dot_mapped(&domain, &state);
        assert!(mapped.contains("heads"));
    }

    #[test]
    fn goal_tree_dump_contains_believes_node() {
        let (domain, _state) = sample_domain();
        let dir = tempfile::tempdir().unwrap();
        let dumper = DatasetDumper::new(dir.path().to_path_buf()).unwrap();
        let path = dumper.dump_goal_tree(&domain, &domain.goal).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("B(alice)"));
    }
}
