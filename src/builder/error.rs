//! Build errors for machine, state, and transition builders.

use crate::definition::CompileError;
use thiserror::Error;

/// Errors that can occur when building machine descriptions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Machine id not specified. Pass a non-empty id to MachineBuilder::new")]
    MissingMachineId,

    #[error("Initial state of '{state}' not specified. Call .initial(key) before .build()")]
    MissingInitialState { state: String },

    #[error("State '{key}' added twice under '{parent}'")]
    DuplicateState { parent: String, key: String },

    #[error("Internal transition on '{event}' has no target. Call .to(target)")]
    MissingTarget { event: String },

    #[error(transparent)]
    Compile(#[from] CompileError),
}
