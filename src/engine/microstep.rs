//! Exit and entry computation for one microstep.
//!
//! A microstep applies a set of non-conflicting transitions: it exits every
//! active state below each transition's domain (innermost first, recording
//! history on the way out), runs the transition actions, and enters the
//! targets together with their ancestors down from the domain and their
//! default descendants (outermost first).

use super::active::ActiveSet;
use super::collector::ActionCollector;
use crate::core::Event;
use crate::definition::{HistoryKind, MachineDefinition, NodeId, StateKind, Transition};
use std::collections::BTreeSet;
use tracing::trace;

/// Apply `transitions` to `active`, returning the done events raised by
/// entering final states.
pub(crate) fn apply<C>(
    machine: &MachineDefinition<C>,
    active: &mut ActiveSet,
    transitions: &[&Transition],
    collector: &mut ActionCollector,
) -> Vec<Event> {
    let mut exits = BTreeSet::new();
    for transition in transitions {
        exits.extend(exit_set(machine, active, transition));
    }

    record_history(machine, active, &exits);
    for &state in exits.iter().rev() {
        collector.exit(machine.node(state));
        active.remove(state);
    }

    for transition in transitions {
        collector.transition(transition);
    }

    let mut entries = EntrySet::new(machine, active);
    for transition in transitions {
        if transition.is_targetless() {
            continue;
        }
        let Some(domain) = transition_domain(machine, transition) else {
            continue;
        };
        for &target in transition.targets() {
            entries.add_descendants(target);
        }
        for target in effective_targets(machine, active, transition) {
            entries.add_ancestors(target, Some(domain));
        }
    }
    let entries = entries.into_states();

    trace!(
        exited = exits.len(),
        entered = entries.len(),
        transitions = transitions.len(),
        "Applied microstep"
    );
    enter(machine, active, entries, collector)
}

/// Enter the root's default descent from an empty configuration.
pub(crate) fn enter_initial<C>(
    machine: &MachineDefinition<C>,
    active: &mut ActiveSet,
    collector: &mut ActionCollector,
) -> Vec<Event> {
    let mut entries = EntrySet::new(machine, active);
    entries.add_descendants(machine.root());
    let entries = entries.into_states();
    enter(machine, active, entries, collector)
}

/// States a transition exits: every active descendant of its domain.
pub(crate) fn exit_set<C>(
    machine: &MachineDefinition<C>,
    active: &ActiveSet,
    transition: &Transition,
) -> BTreeSet<NodeId> {
    match transition_domain(machine, transition) {
        Some(domain) => active
            .iter()
            .filter(|state| machine.is_descendant(*state, domain))
            .collect(),
        None => BTreeSet::new(),
    }
}

/// The compound state (or root) whose descendants a transition exits and
/// enters; `None` when it changes no states at all.
///
/// Computed from the declared targets: a history target stands for its
/// parent's subtree, whatever it has recorded.
fn transition_domain<C>(machine: &MachineDefinition<C>, transition: &Transition) -> Option<NodeId> {
    let targets = transition.targets();
    if targets.is_empty() {
        return None;
    }

    let source = transition.source();
    if transition.is_internal() {
        if targets.iter().all(|target| *target == source) {
            return None;
        }
        if machine.kind(source) == StateKind::Compound
            && targets
                .iter()
                .all(|target| machine.is_descendant(*target, source))
        {
            return Some(source);
        }
    }

    let lcca = machine.ancestors(source).find(|ancestor| {
        (machine.kind(*ancestor) == StateKind::Compound || *ancestor == machine.root())
            && targets
                .iter()
                .all(|target| machine.is_descendant(*target, *ancestor))
    });
    Some(lcca.unwrap_or_else(|| machine.root()))
}

/// Declared targets with history states replaced by what they restore.
fn effective_targets<C>(
    machine: &MachineDefinition<C>,
    active: &ActiveSet,
    transition: &Transition,
) -> Vec<NodeId> {
    let mut targets = Vec::with_capacity(transition.targets().len());
    for &target in transition.targets() {
        if machine.kind(target).is_history() {
            targets.extend(history_targets(machine, active, target));
        } else {
            targets.push(target);
        }
    }
    targets
}

/// Recorded states of a history node, falling back to its default target
/// and then to its parent's default descent.
fn history_targets<C>(
    machine: &MachineDefinition<C>,
    active: &ActiveSet,
    history: NodeId,
) -> Vec<NodeId> {
    if let Some(recorded) = active.recorded(history) {
        return recorded.iter().copied().collect();
    }
    let defaults = machine.node(history).history_default();
    if !defaults.is_empty() {
        return defaults.to_vec();
    }
    let Some(parent) = machine.node(history).parent() else {
        return Vec::new();
    };
    match machine.kind(parent) {
        StateKind::Parallel => machine.state_children(parent).collect(),
        _ => machine.node(parent).initial().into_iter().collect(),
    }
}

fn record_history<C>(machine: &MachineDefinition<C>, active: &mut ActiveSet, exits: &BTreeSet<NodeId>) {
    for &state in exits {
        for &child in machine.node(state).children() {
            let StateKind::History(kind) = machine.kind(child) else {
                continue;
            };
            let recorded: BTreeSet<NodeId> = match kind {
                HistoryKind::Deep => active
                    .leaves(machine)
                    .filter(|leaf| machine.is_descendant(*leaf, state))
                    .collect(),
                HistoryKind::Shallow => machine
                    .state_children(state)
                    .filter(|child| active.contains(*child))
                    .collect(),
            };
            trace!(
                history = machine.node(child).id(),
                recorded = recorded.len(),
                "Recorded history"
            );
            active.record(child, recorded);
        }
    }
}

fn enter<C>(
    machine: &MachineDefinition<C>,
    active: &mut ActiveSet,
    entries: BTreeSet<NodeId>,
    collector: &mut ActionCollector,
) -> Vec<Event> {
    let mut raised = Vec::new();

    for state in entries {
        if active.contains(state) {
            continue;
        }
        active.insert(state);
        collector.entry(machine.node(state));

        if machine.kind(state) != StateKind::Final {
            continue;
        }
        let Some(parent) = machine.node(state).parent() else {
            continue;
        };
        raised.push(Event::done_state(machine.node(parent).id()));

        if let Some(grandparent) = machine.node(parent).parent() {
            if machine.kind(grandparent) == StateKind::Parallel
                && machine
                    .state_children(grandparent)
                    .all(|region| active.is_in_final_state(machine, region))
            {
                raised.push(Event::done_state(machine.node(grandparent).id()));
            }
        }
    }

    raised
}

/// States to enter, kept in document order.
struct EntrySet<'a, C> {
    machine: &'a MachineDefinition<C>,
    active: &'a ActiveSet,
    states: BTreeSet<NodeId>,
}

impl<'a, C> EntrySet<'a, C> {
    fn new(machine: &'a MachineDefinition<C>, active: &'a ActiveSet) -> Self {
        Self {
            machine,
            active,
            states: BTreeSet::new(),
        }
    }

    fn add_descendants(&mut self, state: NodeId) {
        let machine = self.machine;
        match machine.kind(state) {
            StateKind::History(_) => {
                let Some(parent) = machine.node(state).parent() else {
                    return;
                };
                let restored = history_targets(machine, self.active, state);
                for &target in &restored {
                    self.add_descendants(target);
                }
                for target in restored {
                    self.add_ancestors(target, Some(parent));
                }
            }
            StateKind::Compound => {
                self.states.insert(state);
                if let Some(initial) = machine.node(state).initial() {
                    self.add_descendants(initial);
                }
            }
            StateKind::Parallel => {
                self.states.insert(state);
                self.add_uncovered_regions(state);
            }
            StateKind::Atomic | StateKind::Final => {
                self.states.insert(state);
            }
        }
    }

    /// Add the ancestors of `state` strictly below `domain`.
    fn add_ancestors(&mut self, state: NodeId, domain: Option<NodeId>) {
        let machine = self.machine;
        let ancestors: Vec<NodeId> = machine
            .ancestors(state)
            .take_while(|ancestor| Some(*ancestor) != domain)
            .collect();
        for ancestor in ancestors {
            self.states.insert(ancestor);
            if machine.kind(ancestor) == StateKind::Parallel {
                self.add_uncovered_regions(ancestor);
            }
        }
    }

    fn add_uncovered_regions(&mut self, parallel: NodeId) {
        let machine = self.machine;
        let regions: Vec<NodeId> = machine.state_children(parallel).collect();
        for region in regions {
            let covered = self
                .states
                .iter()
                .any(|state| *state == region || machine.is_descendant(*state, region));
            if !covered {
                self.add_descendants(region);
            }
        }
    }

    fn into_states(self) -> BTreeSet<NodeId> {
        self.states
    }
}
