//! A running machine: configuration, context, and executors in one place.

use crate::core::{Action, Configuration, Event, StateHistory, StateValue, TransitionRecord};
use crate::definition::MachineHandle;
use crate::effects::action::{ActionError, ActionExecutor, ServiceError};
use crate::engine::{self, InterpreterError, InterpreterResult, Outcome};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use stillwater::effect::{BoxedEffect, Effect};
use stillwater::prelude::*;
use tracing::{debug, trace};

/// Result of running a step's effect.
#[derive(Clone, Debug, PartialEq)]
pub enum StepResult<C> {
    /// The event moved the machine; every action has run.
    Transitioned {
        event: Event,
        result: InterpreterResult,
        context: C,
    },

    /// No active state handles the event.
    Unchanged { event: Event },
}

/// Imperative shell around the interpreter.
///
/// The interpreter only reports actions. A service keeps the current
/// configuration and context, runs each reported action through its
/// registered executor, and records every macrostep in a [`StateHistory`].
/// Actions without an executor are skipped.
pub struct Service<C, Env> {
    machine: MachineHandle<C>,
    configuration: Configuration,
    value: StateValue,
    done: bool,
    context: C,
    history: StateHistory,
    executors: BTreeMap<String, ActionExecutor<C, Env>>,
}

impl<C, Env> Service<C, Env>
where
    C: Clone + Send + Sync + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Create a service in the machine's initial configuration.
    ///
    /// Initial entry actions are not run; call [`start`](Self::start) to run them.
    pub fn new(machine: MachineHandle<C>, context: C) -> Result<Self, InterpreterError> {
        let initial = engine::initial_state(&machine, &context)?;
        Ok(Self {
            machine,
            configuration: initial.configuration,
            value: initial.value,
            done: initial.done,
            context,
            history: StateHistory::new(),
            executors: BTreeMap::new(),
        })
    }

    /// Recreate a service from persisted parts.
    pub fn resume(
        machine: MachineHandle<C>,
        configuration: Configuration,
        context: C,
        history: StateHistory,
    ) -> Result<Self, InterpreterError> {
        let value = engine::state_value(&machine, &configuration)?;
        let done = engine::is_done(&machine, &configuration)?;
        Ok(Self {
            machine,
            configuration,
            value,
            done,
            context,
            history,
            executors: BTreeMap::new(),
        })
    }

    /// Register the executor for actions of type `kind`.
    pub fn on_action<F>(mut self, kind: impl Into<String>, executor: F) -> Self
    where
        F: Fn(Action, C, Event) -> BoxedEffect<C, ActionError, Env> + Send + Sync + 'static,
    {
        self.executors.insert(kind.into(), Arc::new(executor));
        self
    }

    pub fn machine(&self) -> &MachineHandle<C> {
        &self.machine
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn value(&self) -> &StateValue {
        &self.value
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Whether the root has reached a final state.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the state at dotted `path` is active.
    pub fn matches(&self, path: &str) -> bool {
        self.value.matches(path)
    }

    /// Enter the initial configuration again, running its entry actions.
    pub fn start(&self) -> BoxedEffect<StepResult<C>, ServiceError, Env> {
        let event = Event::new("init");
        match engine::initial_state(&self.machine, &self.context) {
            Ok(result) => self.run(event, result),
            Err(error) => fail(ServiceError::from(error)).boxed(),
        }
    }

    /// Deliver an event.
    ///
    /// Resolution is pure; the returned effect runs the resulting actions.
    /// After running it, call [`apply_result`](Self::apply_result) to move
    /// the service forward.
    pub fn step(&self, event: impl Into<Event>) -> BoxedEffect<StepResult<C>, ServiceError, Env> {
        let event = event.into();
        let outcome = engine::transition(&self.machine, &self.configuration, &self.context, &event);

        match outcome {
            Ok(Outcome::Transitioned(result)) => self.run(event, result),
            Ok(Outcome::Unchanged) => {
                debug!(event = event.name(), "Service ignored event");
                pure(StepResult::Unchanged { event }).boxed()
            }
            Err(error) => fail(ServiceError::from(error)).boxed(),
        }
    }

    fn run(&self, event: Event, result: InterpreterResult) -> BoxedEffect<StepResult<C>, ServiceError, Env> {
        self.run_actions(&result.actions, &event)
            .map(move |context| StepResult::Transitioned {
                event,
                result,
                context,
            })
            .boxed()
    }

    /// Chain the executors of `actions`, threading the context through.
    fn run_actions(&self, actions: &[Action], event: &Event) -> BoxedEffect<C, ServiceError, Env> {
        let mut effect: BoxedEffect<C, ServiceError, Env> = pure(self.context.clone()).boxed();

        for action in actions {
            let Some(executor) = self.executors.get(action.kind()).cloned() else {
                trace!(action = action.kind(), "No executor registered, skipping");
                continue;
            };
            let action = action.clone();
            let event = event.clone();
            effect = effect
                .and_then(move |context| executor(action, context, event).map_err(ServiceError::from))
                .boxed();
        }

        effect
    }

    /// Apply the result from `step()` or `start()`.
    pub fn apply_result(&mut self, result: StepResult<C>) {
        match result {
            StepResult::Transitioned {
                event,
                result,
                context,
            } => {
                let record = TransitionRecord {
                    from: self.configuration.clone(),
                    to: result.configuration.clone(),
                    event: event.name().to_string(),
                    timestamp: Utc::now(),
                    microsteps: result.microsteps,
                };
                debug!(
                    machine = self.machine.id(),
                    event = event.name(),
                    value = %result.value,
                    "Service transitioned"
                );
                self.history = self.history.record(record);
                self.configuration = result.configuration;
                self.value = result.value;
                self.done = result.done;
                self.context = context;
            }
            StepResult::Unchanged { .. } => {}
        }
    }

    /// Run `step(event)` against `env` and apply its result.
    ///
    /// Returns whether the event changed the machine.
    pub async fn send(&mut self, event: impl Into<Event>, env: &Env) -> Result<bool, ServiceError> {
        let result = self.step(event).run(env).await?;
        let transitioned = matches!(result, StepResult::Transitioned { .. });
        self.apply_result(result);
        Ok(transitioned)
    }
}
