//! Builder for constructing whole machines.

use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Action, Guard, GuardRegistry};
use crate::definition::{MachineConfig, MachineDefinition, MachineHandle, StateType};
use crate::engine::InterpreterOptions;

/// Builder for a machine description plus the guards it is compiled with.
pub struct MachineBuilder<C> {
    id: String,
    root: StateBuilder,
    guards: GuardRegistry<C>,
    options: InterpreterOptions,
}

impl<C> MachineBuilder<C> {
    /// Create a new builder for machine `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root: StateBuilder::new(),
            guards: GuardRegistry::new(),
            options: InterpreterOptions::default(),
        }
    }

    /// Set the root's initial child (required unless the root is parallel).
    pub fn initial(mut self, key: impl Into<String>) -> Self {
        self.root = self.root.initial(key);
        self
    }

    /// Make the root a parallel state.
    pub fn parallel(mut self) -> Self {
        self.root = self.root.kind(StateType::Parallel);
        self
    }

    pub fn state(mut self, key: impl Into<String>, state: StateBuilder) -> Self {
        self.root = self.root.state(key, state);
        self
    }

    /// Add a root-level transition, handled from any state.
    pub fn on(mut self, event: impl Into<String>, transition: impl Into<TransitionBuilder>) -> Self {
        self.root = self.root.on(event, transition);
        self
    }

    pub fn on_done(mut self, transition: impl Into<TransitionBuilder>) -> Self {
        self.root = self.root.on_done(transition);
        self
    }

    pub fn entry(mut self, action: impl Into<Action>) -> Self {
        self.root = self.root.entry(action);
        self
    }

    pub fn exit(mut self, action: impl Into<Action>) -> Self {
        self.root = self.root.exit(action);
        self
    }

    /// Register a guard under `name`.
    pub fn guard(mut self, name: impl Into<String>, guard: Guard<C>) -> Self {
        self.guards.register(name, guard);
        self
    }

    pub fn options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the serializable description without compiling it.
    pub fn build_config(&self) -> Result<MachineConfig, BuildError> {
        if self.id.is_empty() {
            return Err(BuildError::MissingMachineId);
        }
        Ok(MachineConfig {
            id: self.id.clone(),
            root: self.root.clone().build(&self.id)?,
        })
    }

    /// Build and compile the machine.
    pub fn build(self) -> Result<MachineHandle<C>, BuildError> {
        let config = self.build_config()?;
        let definition = MachineDefinition::compile_with_options(&config, self.guards, self.options)?;
        Ok(definition.into_handle())
    }
}
