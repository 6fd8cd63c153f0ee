//! Selection of the transitions an event enables.

use super::active::ActiveSet;
use super::error::InterpreterError;
use super::microstep::exit_set;
use crate::core::Event;
use crate::definition::{MachineDefinition, NodeId, Transition};
use std::collections::BTreeSet;
use std::iter;
use tracing::{trace, warn};

/// Select the transitions `event` fires in the active configuration.
///
/// Each active leaf is visited in document order. From the leaf outwards,
/// the first node holding an enabled candidate for the event decides that
/// leaf's transition, so inner states override their ancestors. Candidates
/// on one node are tried in declaration order.
///
/// Leaves in different parallel regions may select different transitions.
/// When two selected transitions would exit a common state, the one whose
/// source lies deeper wins; otherwise the one selected first wins.
pub(crate) fn select_transitions<'m, C>(
    machine: &'m MachineDefinition<C>,
    active: &ActiveSet,
    context: &C,
    event: &Event,
) -> Result<Vec<&'m Transition>, InterpreterError> {
    let mut enabled: Vec<&'m Transition> = Vec::new();

    for leaf in active.leaves(machine) {
        'walk: for node in iter::once(leaf).chain(machine.ancestors(leaf)) {
            for candidate in machine.node(node).transitions_for(event.name()) {
                if enabled.iter().any(|selected| selected.same_as(candidate)) {
                    break 'walk;
                }
                if is_enabled(machine, active, candidate, context, event)? {
                    trace!(
                        event = event.name(),
                        source = machine.node(node).id(),
                        position = candidate.position(),
                        "Selected transition"
                    );
                    enabled.push(candidate);
                    break 'walk;
                }
            }
        }
    }

    Ok(remove_conflicts(machine, active, enabled))
}

fn is_enabled<C>(
    machine: &MachineDefinition<C>,
    active: &ActiveSet,
    transition: &Transition,
    context: &C,
    event: &Event,
) -> Result<bool, InterpreterError> {
    if let Some(required) = transition.in_state() {
        if !active.contains(required) {
            return Ok(false);
        }
    }

    let Some(guard) = transition.guard() else {
        return Ok(true);
    };

    machine
        .guards()
        .evaluate(guard, context, event)
        .map_err(|source| {
            let state = machine.node(transition.source()).id().to_string();
            warn!(
                guard,
                state = %state,
                event = event.name(),
                error = %source,
                "Guard evaluation failed"
            );
            InterpreterError::GuardEvaluation {
                guard: guard.to_string(),
                state,
                event: event.name().to_string(),
                source,
            }
        })
}

fn remove_conflicts<'m, C>(
    machine: &MachineDefinition<C>,
    active: &ActiveSet,
    enabled: Vec<&'m Transition>,
) -> Vec<&'m Transition> {
    let mut kept: Vec<(&'m Transition, BTreeSet<NodeId>)> = Vec::with_capacity(enabled.len());

    for candidate in enabled {
        let exits = exit_set(machine, active, candidate);
        let conflicting: Vec<usize> = kept
            .iter()
            .enumerate()
            .filter(|(_, (_, other))| !exits.is_disjoint(other))
            .map(|(index, _)| index)
            .collect();

        let overrides_all = conflicting.iter().all(|index| {
            machine.is_descendant(candidate.source(), kept[*index].0.source())
        });

        if !overrides_all {
            trace!(
                event = candidate.event(),
                source = machine.node(candidate.source()).id(),
                "Transition preempted by an earlier selection"
            );
            continue;
        }
        for index in conflicting.into_iter().rev() {
            let (preempted, _) = kept.remove(index);
            trace!(
                event = preempted.event(),
                source = machine.node(preempted.source()).id(),
                "Transition preempted by a deeper source"
            );
        }
        kept.push((candidate, exits));
    }

    kept.into_iter().map(|(transition, _)| transition).collect()
}
