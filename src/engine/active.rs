//! The set of active nodes behind a [`Configuration`].
//!
//! A configuration only names leaves; the engine works on the full active
//! set (leaves plus every ancestor), indexed by `NodeId` so that iteration
//! follows document order.

use super::error::ConfigurationError;
use crate::core::{Configuration, StateValue};
use crate::definition::{MachineDefinition, NodeId, StateKind};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ActiveSet {
    states: BTreeSet<NodeId>,
    history: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl ActiveSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Map a caller-supplied configuration onto the definition.
    ///
    /// Unknown ids are always rejected. With `validate` set, the structure is
    /// checked too: only leaves may be listed, compound states have exactly
    /// one active child, parallel states have every region active, and
    /// history records stay inside their parent.
    pub(crate) fn resolve<C>(
        machine: &MachineDefinition<C>,
        configuration: &Configuration,
        validate: bool,
    ) -> Result<Self, ConfigurationError> {
        if configuration.is_empty() {
            return Err(ConfigurationError::Empty);
        }

        let mut active = Self::new();
        for id in configuration.leaves() {
            let node = lookup(machine, id)?;
            if validate && !machine.kind(node).is_leaf() {
                return Err(ConfigurationError::NotALeaf { id: id.to_string() });
            }
            active.states.insert(node);
            active.states.extend(machine.ancestors(node));
        }

        for (id, recorded) in configuration.history() {
            let history = lookup(machine, id)?;
            let parent = match machine.node(history).parent() {
                Some(parent) if machine.kind(history).is_history() => parent,
                _ => return Err(ConfigurationError::NotAHistory { id: id.clone() }),
            };
            let mut states = BTreeSet::new();
            for state in recorded {
                let node = lookup(machine, state)?;
                if validate && !machine.is_descendant(node, parent) {
                    return Err(ConfigurationError::InvalidHistoryRecord {
                        history: id.clone(),
                        recorded: state.clone(),
                    });
                }
                states.insert(node);
            }
            active.history.insert(history, states);
        }

        if validate {
            active.check_structure(machine)?;
        }
        Ok(active)
    }

    fn check_structure<C>(&self, machine: &MachineDefinition<C>) -> Result<(), ConfigurationError> {
        for &node in &self.states {
            match machine.kind(node) {
                StateKind::Compound => {
                    let children = machine
                        .state_children(node)
                        .filter(|child| self.contains(*child))
                        .count();
                    if children > 1 {
                        return Err(ConfigurationError::ConflictingChildren {
                            state: machine.node(node).id().to_string(),
                        });
                    }
                }
                StateKind::Parallel => {
                    if let Some(region) = machine
                        .state_children(node)
                        .find(|region| !self.contains(*region))
                    {
                        return Err(ConfigurationError::MissingRegion {
                            state: machine.node(node).id().to_string(),
                            region: machine.node(region).key().to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn contains(&self, node: NodeId) -> bool {
        self.states.contains(&node)
    }

    pub(crate) fn insert(&mut self, node: NodeId) {
        self.states.insert(node);
    }

    pub(crate) fn remove(&mut self, node: NodeId) {
        self.states.remove(&node);
    }

    /// Active nodes in document order.
    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.states.iter().copied()
    }

    /// Active nodes with no active children, in document order.
    pub(crate) fn leaves<'a, C>(
        &'a self,
        machine: &'a MachineDefinition<C>,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.iter().filter(move |node| {
            !machine
                .node(*node)
                .children()
                .iter()
                .any(|child| self.contains(*child))
        })
    }

    pub(crate) fn recorded(&self, history: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.history.get(&history)
    }

    pub(crate) fn record(&mut self, history: NodeId, states: BTreeSet<NodeId>) {
        self.history.insert(history, states);
    }

    /// Whether `node` has completed: a compound state with an active final
    /// child, or a parallel state whose regions have all completed.
    pub(crate) fn is_in_final_state<C>(&self, machine: &MachineDefinition<C>, node: NodeId) -> bool {
        match machine.kind(node) {
            StateKind::Compound => machine
                .state_children(node)
                .any(|child| self.contains(child) && machine.kind(child) == StateKind::Final),
            StateKind::Parallel => machine
                .state_children(node)
                .all(|region| self.is_in_final_state(machine, region)),
            _ => false,
        }
    }

    pub(crate) fn to_configuration<C>(&self, machine: &MachineDefinition<C>) -> Configuration {
        let leaves = self
            .leaves(machine)
            .map(|leaf| machine.node(leaf).id().to_string())
            .collect::<Vec<_>>();
        let history = self
            .history
            .iter()
            .map(|(history, states)| {
                let states = states
                    .iter()
                    .map(|state| machine.node(*state).id().to_string())
                    .collect();
                (machine.node(*history).id().to_string(), states)
            })
            .collect();
        Configuration::new(leaves).with_history(history)
    }

    pub(crate) fn value<C>(&self, machine: &MachineDefinition<C>) -> StateValue {
        let paths = self
            .leaves(machine)
            .map(|leaf| relative_path(machine, leaf))
            .collect::<Vec<_>>();
        StateValue::from_paths(paths.iter().map(String::as_str))
    }
}

fn lookup<C>(machine: &MachineDefinition<C>, id: &str) -> Result<NodeId, ConfigurationError> {
    machine
        .lookup(id)
        .ok_or_else(|| ConfigurationError::UnknownState { id: id.to_string() })
}

/// Dotted key path from the root, excluding the root itself.
pub(crate) fn relative_path<C>(machine: &MachineDefinition<C>, node: NodeId) -> String {
    let mut keys: Vec<&str> = std::iter::once(node)
        .chain(machine.ancestors(node))
        .filter(|id| *id != machine.root())
        .map(|id| machine.node(id).key())
        .collect();
    keys.reverse();
    keys.join(".")
}

/// Rebuild the configuration a `StateValue` describes.
pub(crate) fn configuration_from_value<C>(
    machine: &MachineDefinition<C>,
    value: &StateValue,
) -> Result<Configuration, ConfigurationError> {
    let mut leaves = Vec::new();
    collect_leaves(machine, machine.root(), value, &mut leaves)?;
    Ok(Configuration::new(
        leaves.into_iter().map(|leaf| machine.node(leaf).id().to_string()),
    ))
}

fn collect_leaves<C>(
    machine: &MachineDefinition<C>,
    node: NodeId,
    value: &StateValue,
    leaves: &mut Vec<NodeId>,
) -> Result<(), ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidValue {
        state: machine.node(node).id().to_string(),
        reason,
    };
    let child = |key: &str| {
        machine
            .child_by_key(node, key)
            .filter(|child| !machine.kind(*child).is_history())
            .ok_or_else(|| invalid(format!("no child state '{key}'")))
    };

    match (machine.kind(node), value) {
        (StateKind::Atomic | StateKind::Final, value) if value.is_empty() => {
            leaves.push(node);
            Ok(())
        }
        (StateKind::Atomic | StateKind::Final, _) => {
            Err(invalid("atomic states have no children".to_string()))
        }
        (StateKind::Compound, StateValue::Leaf(key)) => {
            collect_leaves(machine, child(key)?, &StateValue::empty(), leaves)
        }
        (StateKind::Compound, StateValue::Nested(children)) => {
            let mut entries = children.iter();
            match (entries.next(), entries.next()) {
                (Some((key, sub)), None) => collect_leaves(machine, child(key)?, sub, leaves),
                (None, _) => Err(invalid("no active child".to_string())),
                (Some(_), Some(_)) => Err(invalid("more than one active child".to_string())),
            }
        }
        (StateKind::Parallel, StateValue::Nested(regions)) => {
            if let Some(key) = regions.keys().find(|key| child(key).is_err()) {
                return Err(invalid(format!("no region '{key}'")));
            }
            for region in machine.state_children(node) {
                let key = machine.node(region).key();
                let sub = regions
                    .get(key)
                    .ok_or_else(|| invalid(format!("region '{key}' is missing")))?;
                collect_leaves(machine, region, sub, leaves)?;
            }
            Ok(())
        }
        (StateKind::Parallel, StateValue::Leaf(key)) => {
            let region = child(key)?;
            if machine.state_children(node).count() != 1 {
                return Err(invalid("every region must be listed".to_string()));
            }
            collect_leaves(machine, region, &StateValue::empty(), leaves)
        }
        (StateKind::History(_), _) => Err(invalid("history states are never active".to_string())),
    }
}
