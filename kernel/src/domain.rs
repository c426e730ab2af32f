//! The grounded, read-only domain: fluents, agents, actions, and the
//! initial/goal formulae that describe a planning problem.
//!
//! Grounded on `original_source/src/domain/Domain.*` and, for the
//! initial-condition side, `InitialStateInformation.*` (see
//! [`InitialConstraints`], a supplemented feature from SPEC_FULL.md §11).

use std::collections::BTreeMap;

use crate::action::{Action, ActionKind};
use crate::bitset::{Agent, ActionId};
use crate::error::KernelError;
use crate::formula::BeliefFormula;
use crate::grounder::Grounder;

/// The `C(G, f)` / `C(G, B(a,f) or !B(a,f))` / `C(G, !B(a,f) and !B(a,!f))`
/// constraints collected from a domain file's `initially` block, kept as a
/// first-class value distinct from the worlds they end up generating.
///
/// This is a supplemented feature (SPEC_FULL.md §11 item 4): the original
/// planner's `InitialStateInformation` keeps exactly this set of
/// constraints apart from the built `KripkeState`, which lets the harness
/// re-validate an `--execute-actions` replay's initial world against the
/// declared constraints without rebuilding the whole enumeration.
#[derive(Debug, Clone, Default)]
pub struct InitialConstraints {
    /// Plain propositional facts known to hold initially (`C(G, f)`).
    pub known_facts: Vec<BeliefFormula>,
    /// Full belief formulae holding initially, including nested `B`/`E`/`C`/`D`.
    pub belief_facts: Vec<BeliefFormula>,
}

impl InitialConstraints {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, formula: BeliefFormula) {
        match &formula {
            BeliefFormula::Fluent(_) | BeliefFormula::Not(_) | BeliefFormula::And(_) => {
                self.known_facts.push(formula);
            }
            _ => self.belief_facts.push(formula),
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &BeliefFormula> {
        self.known_facts.iter().chain(self.belief_facts.iter())
    }
}

/// A fully grounded planning domain.
#[derive(Debug, Clone)]
pub struct Domain {
    pub grounder: Grounder,
    pub actions: BTreeMap<ActionId, Action>,
    pub initial: InitialConstraints,
    pub goal: BeliefFormula,
    pub max_depth: u16,
}

impl Domain {
    #[must_use]
    pub fn new(grounder: Grounder, goal: BeliefFormula, max_depth: u16) -> Self {
        Self {
            grounder,
            actions: BTreeMap::new(),
            initial: InitialConstraints::new(),
            goal,
            max_depth,
        }
    }

    /// Validate that every action has a resolved `ActionKind` -- the
    /// action-type-conflict check called out in spec.md's REDESIGN FLAGS.
    /// Ontic actions are entitled to `fully`/`partially` observance guards
    /// just like sensing/announcement actions (spec.md §4.1: "Partition
    /// agents into `fully = {a : guard(a) holds}` and `oblivious`"); only an
    /// unresolved informative type is a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ConflictingActionType`] if validation fails.
    pub fn validate(&self) -> Result<(), KernelError> {
        for action in self.actions.values() {
            if action.kind == ActionKind::NotSet {
                return Err(KernelError::ConflictingActionType {
                    action: self
                        .grounder
                        .action_name(action.id)
                        .unwrap_or("?")
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = Agent> + '_ {
        self.grounder.agents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::BeliefFormula;
    use crate::grounder::GrounderBuilder;

    #[test]
    fn validate_rejects_notset_action() {
        let mut builder = GrounderBuilder::new();
        let id = builder.register_action("a");
        let grounder = builder.build();
        let mut domain = Domain::new(grounder, BeliefFormula::Top, 5);
        domain
            .actions
            .insert(id, Action::new(id, ActionKind::NotSet, BeliefFormula::Top));
        assert!(domain.validate().is_err());
    }

    #[test]
    fn validate_accepts_ontic_action_with_fully_observants() {
        let mut builder = GrounderBuilder::new();
        let id = builder.register_action("a");
        let agent = builder.register_agent("alice");
        let grounder = builder.build();
        let mut domain = Domain::new(grounder, BeliefFormula::Top, 5);
        let mut action = Action::new(id, ActionKind::Ontic, BeliefFormula::Top);
        action.fully_observants.insert(agent, BeliefFormula::Top);
        domain.actions.insert(id, action);
        assert!(domain.validate().is_ok());
    }

    #[test]
    fn validate_accepts_well_formed_action() {
        let mut builder = GrounderBuilder::new();
        let id = builder.register_action("a");
        let grounder = builder.build();
        let mut domain = Domain::new(grounder, BeliefFormula::Top, 5);
        domain
            .actions
            .insert(id, Action::new(id, ActionKind::Ontic, BeliefFormula::Top));
        assert!(domain.validate().is_ok());
    }

    #[test]
    fn initial_constraints_split_by_shape() {
        let mut constraints = InitialConstraints::new();
        constraints.push(BeliefFormula::Fluent(crate::bitset::Fluent::new(1, true)));
        constraints.push(BeliefFormula::believes(
            Agent(0),
            BeliefFormula::Fluent(crate::bitset::Fluent::new(1, true)),
        ));
        assert_eq!(constraints.known_facts.len(), 1);
        assert_eq!(constraints.belief_facts.len(), 1);
    }
}
