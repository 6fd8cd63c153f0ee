//! Errors detected while compiling a machine description.

use thiserror::Error;

/// A single problem with a machine description.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error("Machine id must not be empty")]
    MissingMachineId,

    #[error("Compound state '{state}' does not declare an initial state")]
    MissingInitial { state: String },

    #[error("Initial state '{initial}' of '{state}' is not a child state")]
    UnknownInitial { state: String, initial: String },

    #[error("Target '{target}' of '{event}' on '{state}' does not resolve to a state")]
    UnresolvedTarget {
        state: String,
        event: String,
        target: String,
    },

    #[error("Guard '{guard}' of '{event}' on '{state}' is not registered")]
    UnknownGuard {
        state: String,
        event: String,
        guard: String,
    },

    #[error("In-state condition '{reference}' of '{event}' on '{state}' does not resolve to a state")]
    UnresolvedInState {
        state: String,
        event: String,
        reference: String,
    },

    #[error("State id '{id}' is declared more than once")]
    DuplicateId { id: String },

    #[error("Invalid state key '{key}' under '{parent}': keys must be non-empty and contain no '.' or '#'")]
    InvalidKey { parent: String, key: String },

    #[error("Final state '{state}' {reason}")]
    InvalidFinal { state: String, reason: String },

    #[error("History state '{state}' {reason}")]
    InvalidHistory { state: String, reason: String },

    #[error("Atomic state '{state}' declares child states")]
    UnexpectedChildren { state: String },

    #[error("Parallel state '{state}' has no regions")]
    EmptyParallel { state: String },

    #[error("Targets {targets:?} of '{event}' on '{state}' are not in distinct parallel regions")]
    ConflictingTargets {
        state: String,
        event: String,
        targets: Vec<String>,
    },
}

/// Every problem found in a machine description.
///
/// Compilation reports all problems at once; no partial machine is built.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid machine definition: {}", join_errors(.errors))]
pub struct CompileError {
    errors: Vec<DefinitionError>,
}

impl CompileError {
    pub(crate) fn new(errors: Vec<DefinitionError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[DefinitionError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<DefinitionError> {
        self.errors
    }
}

fn join_errors(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
