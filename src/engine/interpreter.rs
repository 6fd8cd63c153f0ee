//! The public entry points of the engine.
//!
//! Every function here is pure: the definition is shared read-only, the
//! caller's configuration and context are borrowed, and the result is a new
//! value. Calling any of them twice with the same inputs yields the same
//! output.

use super::active::{self, ActiveSet};
use super::collector::ActionCollector;
use super::error::{ConfigurationError, InterpreterError};
use super::{microstep, resolver};
use crate::core::{Action, Configuration, Event, GuardRegistry, StateValue, DONE_STATE_PREFIX};
use crate::definition::{CompileError, MachineConfig, MachineDefinition, MachineHandle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

/// The state reached by a call and the actions the caller should run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpreterResult {
    pub configuration: Configuration,
    /// `configuration` rendered relative to the root.
    pub value: StateValue,
    /// Exit, transition, and entry actions in execution order.
    pub actions: Vec<Action>,
    /// Whether the root has reached a final state.
    pub done: bool,
    /// Microsteps taken, counting the one for the external event.
    pub microsteps: usize,
}

/// Result of delivering an event.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Transitioned(InterpreterResult),
    /// No active state handles the event; the configuration stands and
    /// there are no actions to run.
    Unchanged,
}

impl Outcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Outcome::Unchanged)
    }

    pub fn result(&self) -> Option<&InterpreterResult> {
        match self {
            Outcome::Transitioned(result) => Some(result),
            Outcome::Unchanged => None,
        }
    }

    pub fn into_result(self) -> Option<InterpreterResult> {
        match self {
            Outcome::Transitioned(result) => Some(result),
            Outcome::Unchanged => None,
        }
    }
}

/// Compile a description into a shareable handle.
pub fn compile<C>(
    config: &MachineConfig,
    guards: GuardRegistry<C>,
) -> Result<MachineHandle<C>, CompileError> {
    MachineDefinition::compile(config, guards).map(MachineDefinition::into_handle)
}

/// Enter the machine's default configuration.
///
/// Final states reached on the way in raise done events, which are handled
/// exactly as in [`transition`]; guards on those transitions see `context`.
pub fn initial_state<C>(
    machine: &MachineDefinition<C>,
    context: &C,
) -> Result<InterpreterResult, InterpreterError> {
    let mut active = ActiveSet::new();
    let mut collector = ActionCollector::new();

    let raised = microstep::enter_initial(machine, &mut active, &mut collector);
    let microsteps = run_internal(machine, &mut active, context, raised, &mut collector, 1)?;

    let result = finish(machine, &active, collector, microsteps);
    debug!(
        machine = machine.id(),
        value = %result.value,
        actions = result.actions.len(),
        "Entered initial configuration"
    );
    Ok(result)
}

/// Deliver `event` to a machine in `configuration`.
///
/// Returns [`Outcome::Unchanged`] when no active state has an enabled
/// transition for the event. Guard failures and invalid configurations
/// abort the call without producing a configuration.
pub fn transition<C>(
    machine: &MachineDefinition<C>,
    configuration: &Configuration,
    context: &C,
    event: &Event,
) -> Result<Outcome, InterpreterError> {
    let validate = machine.options().validate_configuration;
    let mut active = ActiveSet::resolve(machine, configuration, validate).map_err(|error| {
        warn!(machine = machine.id(), error = %error, "Rejected configuration");
        InterpreterError::from(error)
    })?;

    let selected = resolver::select_transitions(machine, &active, context, event)?;
    if selected.is_empty() {
        debug!(machine = machine.id(), event = event.name(), "Event not handled");
        return Ok(Outcome::Unchanged);
    }

    let mut collector = ActionCollector::new();
    check_limit(machine, 1)?;
    let raised = microstep::apply(machine, &mut active, &selected, &mut collector);
    let microsteps = run_internal(machine, &mut active, context, raised, &mut collector, 1)?;

    let result = finish(machine, &active, collector, microsteps);
    debug!(
        machine = machine.id(),
        event = event.name(),
        value = %result.value,
        actions = result.actions.len(),
        microsteps,
        "Transitioned"
    );
    Ok(Outcome::Transitioned(result))
}

/// [`transition`] for anything convertible to an [`Event`].
///
/// ```rust
/// use statecraft::core::{Configuration, GuardRegistry};
/// use statecraft::definition::MachineConfig;
/// use statecraft::engine::{compile, initial_state, send, Outcome};
///
/// let config = MachineConfig::from_json(r#"{
///     "id": "toggle",
///     "initial": "off",
///     "states": {
///         "off": { "on": { "TOGGLE": "on" } },
///         "on": { "on": { "TOGGLE": "off" } }
///     }
/// }"#).unwrap();
/// let machine = compile(&config, GuardRegistry::<()>::new()).unwrap();
///
/// let start = initial_state(&machine, &()).unwrap();
/// assert_eq!(start.value.to_string(), "off");
///
/// let next = send(&machine, &start.configuration, &(), "TOGGLE").unwrap();
/// assert_eq!(next.result().unwrap().value.to_string(), "on");
///
/// let ignored = send(&machine, &start.configuration, &(), "NOOP").unwrap();
/// assert_eq!(ignored, Outcome::Unchanged);
/// ```
pub fn send<C>(
    machine: &MachineDefinition<C>,
    configuration: &Configuration,
    context: &C,
    event: impl Into<Event>,
) -> Result<Outcome, InterpreterError> {
    transition(machine, configuration, context, &event.into())
}

/// Event names some active state declares a transition for, sorted.
///
/// Done events are internal and not listed.
pub fn next_events<C>(
    machine: &MachineDefinition<C>,
    configuration: &Configuration,
) -> Result<Vec<String>, InterpreterError> {
    let active = resolve(machine, configuration)?;
    let events: BTreeSet<&str> = active
        .iter()
        .flat_map(|state| machine.node(state).events())
        .filter(|event| !event.starts_with(DONE_STATE_PREFIX))
        .collect();
    Ok(events.into_iter().map(str::to_string).collect())
}

/// Whether the state at dotted `path` (relative to the root) is active.
pub fn matches<C>(
    machine: &MachineDefinition<C>,
    configuration: &Configuration,
    path: &str,
) -> Result<bool, InterpreterError> {
    let active = resolve(machine, configuration)?;
    Ok(machine
        .find_path(path)
        .is_some_and(|state| active.contains(state)))
}

/// Whether the root has reached a final state.
pub fn is_done<C>(
    machine: &MachineDefinition<C>,
    configuration: &Configuration,
) -> Result<bool, InterpreterError> {
    let active = resolve(machine, configuration)?;
    Ok(active.is_in_final_state(machine, machine.root()))
}

/// Render a configuration as a [`StateValue`].
pub fn state_value<C>(
    machine: &MachineDefinition<C>,
    configuration: &Configuration,
) -> Result<StateValue, InterpreterError> {
    Ok(resolve(machine, configuration)?.value(machine))
}

/// Rebuild the configuration a persisted [`StateValue`] describes.
///
/// History records are not part of a state value, so the result has none.
pub fn configuration_from_value<C>(
    machine: &MachineDefinition<C>,
    value: &StateValue,
) -> Result<Configuration, ConfigurationError> {
    active::configuration_from_value(machine, value)
}

fn resolve<C>(
    machine: &MachineDefinition<C>,
    configuration: &Configuration,
) -> Result<ActiveSet, InterpreterError> {
    let validate = machine.options().validate_configuration;
    Ok(ActiveSet::resolve(machine, configuration, validate)?)
}

fn check_limit<C>(machine: &MachineDefinition<C>, taken: usize) -> Result<(), InterpreterError> {
    let limit = machine.options().max_microsteps;
    if taken > limit {
        warn!(machine = machine.id(), limit, "Microstep limit exceeded");
        return Err(InterpreterError::MicrostepLimit { limit });
    }
    Ok(())
}

/// Process raised done events in FIFO order, one microstep each.
fn run_internal<C>(
    machine: &MachineDefinition<C>,
    active: &mut ActiveSet,
    context: &C,
    raised: Vec<Event>,
    collector: &mut ActionCollector,
    mut taken: usize,
) -> Result<usize, InterpreterError> {
    let mut queue: VecDeque<Event> = raised.into();

    while let Some(event) = queue.pop_front() {
        let selected = resolver::select_transitions(machine, active, context, &event)?;
        if selected.is_empty() {
            continue;
        }
        taken += 1;
        check_limit(machine, taken)?;
        debug!(
            machine = machine.id(),
            event = event.name(),
            transitions = selected.len(),
            "Handling internal event"
        );
        queue.extend(microstep::apply(machine, active, &selected, collector));
    }

    Ok(taken)
}

fn finish<C>(
    machine: &MachineDefinition<C>,
    active: &ActiveSet,
    collector: ActionCollector,
    microsteps: usize,
) -> InterpreterResult {
    InterpreterResult {
        configuration: active.to_configuration(machine),
        value: active.value(machine),
        done: active.is_in_final_state(machine, machine.root()),
        actions: collector.into_actions(),
        microsteps,
    }
}
