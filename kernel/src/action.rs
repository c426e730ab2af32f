//! Grounded action definitions: executability, effects, and observability.
//!
//! Grounded on `original_source/src/actions/Action.*`. Observability is
//! stored as guard-formula maps (`fully_observants`/`partially_observants`),
//! never as a cached role on the agent -- [`Action::role_of`] evaluates the
//! guard against a world each time it is asked, per the Open Question
//! resolution recorded in DESIGN.md (role is derived, not stored).

use std::collections::BTreeMap;

use crate::bitset::{Agent, ActionId, FluentsSet};
use crate::formula::{BeliefFormula, FluentFormula};

/// The four action shapes the domain language distinguishes. `NotSet` is a
/// parsing intermediate value, never present on a fully-grounded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    NotSet,
    Ontic,
    Sensing,
    Announcement,
}

/// What an agent is, with respect to one action and one world: a full
/// observer sees both the action's occurrence and its outcome; a partial
/// observer sees that something happened but not the outcome; an oblivious
/// agent notices nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedRole {
    Fully,
    Partially,
    Oblivious,
}

/// A single grounded action.
#[derive(Debug, Clone)]
pub struct Action {
    pub id: ActionId,
    pub kind: ActionKind,
    pub executability: BeliefFormula,
    /// Effect literal set -> guard formula under which it applies. Per the
    /// domain's restriction, effect leaves are singleton `FluentFormula`s.
    pub effects: BTreeMap<FluentFormula, BeliefFormula>,
    pub fully_observants: BTreeMap<Agent, BeliefFormula>,
    pub partially_observants: BTreeMap<Agent, BeliefFormula>,
}

impl Action {
    #[must_use]
    pub fn new(id: ActionId, kind: ActionKind, executability: BeliefFormula) -> Self {
        Self {
            id,
            kind,
            executability,
            effects: BTreeMap::new(),
            fully_observants: BTreeMap::new(),
            partially_observants: BTreeMap::new(),
        }
    }

    /// Evaluate this action's observability role for `agent` at `world`,
    /// by checking which (if any) guard is entailed. A world satisfying
    /// both a fully- and partially-observant guard for the same agent is a
    /// domain-authoring error caught at grounding time
    /// ([`crate::error::KernelError::ConflictingObservance`]), so at
    /// runtime at most one guard fires.
    #[must_use]
    pub fn role_of(
        &self,
        agent: Agent,
        entails: impl Fn(&BeliefFormula) -> bool,
    ) -> ObservedRole {
        if let Some(guard) = self.fully_observants.get(&agent) {
            if entails(guard) {
                return ObservedRole::Fully;
            }
        }
        if let Some(guard) = self.partially_observants.get(&agent) {
            if entails(guard) {
                return ObservedRole::Partially;
            }
        }
        ObservedRole::Oblivious
    }

    /// The union of every effect literal set whose guard is entailed by
    /// `entails`, as a single merged conjunction (spec.md's "let the effect
    /// fluent-set E be the union of all effect postconditions whose guards
    /// hold"). `entails` is evaluated once by the caller at the state's
    /// pointed world, not per destination world -- guard evaluation is a
    /// property of the action invocation, not of each minted copy.
    ///
    /// Simultaneously-firing guarded effects are merged via
    /// [`FluentsSet::with_overwritten`] in map order; a later literal wins
    /// over an earlier, contradictory one from a different guard, matching
    /// `with_overwritten`'s overwrite-on-apply semantics elsewhere in this
    /// crate.
    #[must_use]
    pub fn effect_set(&self, entails: impl Fn(&BeliefFormula) -> bool) -> FluentsSet {
        let mut merged = FluentsSet::new();
        for (formula, guard) in &self.effects {
            if entails(guard) {
                if let Some(set) = formula.as_singleton() {
                    merged = merged.with_overwritten(set);
                }
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::Fluent;

    #[test]
    fn role_of_prefers_fully_over_partially() {
        let mut action = Action::new(ActionId(0), ActionKind::Sensing, BeliefFormula::Top);
        action
            .fully_observants
            .insert(Agent(0), BeliefFormula::Top);
        action
            .partially_observants
            .insert(Agent(0), BeliefFormula::Top);
        assert_eq!(
            action.role_of(Agent(0), |_| true),
            ObservedRole::Fully
        );
    }

    #[test]
    fn role_of_defaults_oblivious() {
        let action = Action::new(ActionId(0), ActionKind::Ontic, BeliefFormula::Top);
        assert_eq!(
            action.role_of(Agent(0), |_| true),
            ObservedRole::Oblivious
        );
    }

    #[test]
    fn effect_set_picks_entailed_guard() {
        let mut action = Action::new(ActionId(0), ActionKind::Ontic, BeliefFormula::Top);
        let effect = FluentFormula::from_singleton(
            FluentsSet::try_from_literals([Fluent::new(1, true)]).unwrap(),
        );
        action.effects.insert(effect.clone(), BeliefFormula::Top);
        let applied = action.effect_set(|_| true);
        assert_eq!(applied.value_of(1), Some(true));
    }

    #[test]
    fn effect_set_ignores_unentailed_guard() {
        let mut action = Action::new(ActionId(0), ActionKind::Ontic, BeliefFormula::Top);
        let effect = FluentFormula::from_singleton(
            FluentsSet::try_from_literals([Fluent::new(1, true)]).unwrap(),
        );
        action.effects.insert(effect, BeliefFormula::Top);
        let applied = action.effect_set(|_| false);
        assert!(applied.is_empty());
    }

    #[test]
    fn effect_set_merges_multiple_firing_guards() {
        let mut action = Action::new(ActionId(0), ActionKind::Ontic, BeliefFormula::Top);
        action.effects.insert(
            FluentFormula::from_singleton(
                FluentsSet::try_from_literals([Fluent::new(1, true)]).unwrap(),
            ),
            BeliefFormula::Top,
        );
        action.effects.insert(
            FluentFormula::from_singleton(
                FluentsSet::try_from_literals([Fluent::new(2, false)]).unwrap(),
            ),
            BeliefFormula::Top,
        );
        let applied = action.effect_set(|_| true);
        assert_eq!(applied.value_of(1), Some(true));
        assert_eq!(applied.value_of(2), Some(false));
    }
}
