//! Bidirectional name-to-id mapping for fluents, agents, and actions.
//!
//! A `Grounder` is built once during domain construction and is read-only
//! afterward -- every downstream structure (formulae, actions, states) holds
//! only ids, never names, and looks names back up through the grounder only
//! for parsing errors and display.

use std::collections::BTreeMap;

use crate::bitset::{Agent, ActionId};

/// Read-only name/id tables for one domain.
#[derive(Debug, Clone, Default)]
pub struct Grounder {
    fluent_names: Vec<String>,
    fluent_ids: BTreeMap<String, u32>,
    agent_names: Vec<String>,
    agent_ids: BTreeMap<String, u32>,
    action_names: Vec<String>,
    action_ids: BTreeMap<String, u32>,
}

/// Error returned when a name is looked up but was never registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

impl std::fmt::Display for UnknownName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.name)
    }
}

impl std::error::Error for UnknownName {}

/// Builder used while parsing a domain file; consumed into a [`Grounder`]
/// once all declarations have been seen.
#[derive(Debug, Default)]
pub struct GrounderBuilder {
    grounder: Grounder,
}

impl GrounderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fluent name, returning its id (idempotent: re-registering
    /// the same name returns the same id).
    pub fn register_fluent(&mut self, name: &str) -> u32 {
        register(
            &mut self.grounder.fluent_names,
            &mut self.grounder.fluent_ids,
            name,
        )
    }

    pub fn register_agent(&mut self, name: &str) -> Agent {
        Agent(register(
            &mut self.grounder.agent_names,
            &mut self.grounder.agent_ids,
            name,
        ))
    }

    pub fn register_action(&mut self, name: &str) -> ActionId {
        ActionId(register(
            &mut self.grounder.action_names,
            &mut self.grounder.action_ids,
            name,
        ))
    }

    #[must_use]
    pub fn build(self) -> Grounder {
        self.grounder
    }
}

fn register(names: &mut Vec<String>, ids: &mut BTreeMap<String, u32>, name: &str) -> u32 {
    if let Some(&id) = ids.get(name) {
        return id;
    }
    let id = u32::try_from(names.len()).expect("fewer than u32::MAX identifiers");
    names.push(name.to_string());
    ids.insert(name.to_string(), id);
    id
}

impl Grounder {
    #[must_use]
    pub fn fluent_count(&self) -> usize {
        self.fluent_names.len()
    }

    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agent_names.len()
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.action_names.len()
    }

    pub fn fluent_id(&self, name: &str) -> Result<u32, UnknownName> {
        self.fluent_ids
            .get(name)
            .copied()
            .ok_or_else(|| UnknownName {
                kind: "fluent",
                name: name.to_string(),
            })
    }

    pub fn agent_id(&self, name: &str) -> Result<Agent, UnknownName> {
        self.agent_ids
            .get(name)
            .copied()
            .map(Agent)
            .ok_or_else(|| UnknownName {
                kind: "agent",
                name: name.to_string(),
            })
    }

    pub fn action_id(&self, name: &str) -> Result<ActionId, UnknownName> {
        self.action_ids
            .get(name)
            .copied()
            .map(ActionId)
            .ok_or_else(|| UnknownName {
                kind: "action",
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn fluent_name(&self, id: u32) -> Option<&str> {
        self.fluent_names.get(id as usize).map(String::as_str)
    }

    #[must_use]
    pub fn agent_name(&self, agent: Agent) -> Option<&str> {
        self.agent_names.get(agent.0 as usize).map(String::as_str)
    }

    #[must_use]
    pub fn action_name(&self, action: ActionId) -> Option<&str> {
        self.action_names.get(action.0 as usize).map(String::as_str)
    }

    pub fn agents(&self) -> impl Iterator<Item = Agent> + '_ {
        (0..self.agent_names.len()).map(|i| Agent(i as u32))
    }

    pub fn actions(&self) -> impl Iterator<Item = ActionId> + '_ {
        (0..self.action_names.len()).map(|i| ActionId(i as u32))
    }
}
