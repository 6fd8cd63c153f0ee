//! Errors raised by a single interpreter call.

use crate::core::GuardError;
use thiserror::Error;

/// A caller-supplied configuration that the definition cannot have produced.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Configuration has no active states")]
    Empty,

    #[error("Unknown state '{id}'")]
    UnknownState { id: String },

    #[error("State '{id}' is not an atomic or final state")]
    NotALeaf { id: String },

    #[error("Compound state '{state}' has more than one active child")]
    ConflictingChildren { state: String },

    #[error("Region '{region}' of parallel state '{state}' is not active")]
    MissingRegion { state: String, region: String },

    #[error("'{id}' is not a history state")]
    NotAHistory { id: String },

    #[error("History '{history}' records '{recorded}', which is not inside its parent")]
    InvalidHistoryRecord { history: String, recorded: String },

    #[error("State value does not fit '{state}': {reason}")]
    InvalidValue { state: String, reason: String },
}

/// Failure of a `transition` call.
///
/// A failed call produces no new configuration; the caller's configuration
/// and the definition are untouched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InterpreterError {
    #[error("Guard '{guard}' on '{state}' failed while handling '{event}': {source}")]
    GuardEvaluation {
        guard: String,
        state: String,
        event: String,
        #[source]
        source: GuardError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    #[error("Exceeded {limit} microsteps while processing internal events")]
    MicrostepLimit { limit: usize },
}

impl InterpreterError {
    pub fn is_guard_failure(&self) -> bool {
        matches!(self, InterpreterError::GuardEvaluation { .. })
    }
}
