//! Builder API for ergonomic machine construction.
//!
//! This module provides fluent builders producing the same
//! [`MachineConfig`](crate::definition::MachineConfig) documents that can be
//! written as JSON, plus shorthands for the most common transitions.

pub mod error;
pub mod machine;
pub mod state;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
pub use transition::TransitionBuilder;

/// Create a plain transition to `target`.
///
/// # Example
///
/// ```
/// use statecraft::builder::{simple_transition, MachineBuilder, StateBuilder};
///
/// let machine = MachineBuilder::<()>::new("toggle")
///     .initial("off")
///     .state("off", StateBuilder::new().on("TOGGLE", simple_transition("on")))
///     .state("on", StateBuilder::new().on("TOGGLE", simple_transition("off")))
///     .build();
/// assert!(machine.is_ok());
/// ```
pub fn simple_transition(target: impl Into<String>) -> TransitionBuilder {
    TransitionBuilder::new().to(target)
}

/// Create a transition to `target` gated by the guard named `guard`.
///
/// # Example
///
/// ```
/// use statecraft::builder::{guarded_transition, MachineBuilder, StateBuilder};
/// use statecraft::core::{Event, Guard};
///
/// let machine = MachineBuilder::new("door")
///     .initial("closed")
///     .guard("unlocked", Guard::new(|locked: &bool, _: &Event| !*locked))
///     .state("closed", StateBuilder::new().on("OPEN", guarded_transition("open", "unlocked")))
///     .state("open", StateBuilder::new())
///     .build();
/// assert!(machine.is_ok());
/// ```
pub fn guarded_transition(target: impl Into<String>, guard: impl Into<String>) -> TransitionBuilder {
    TransitionBuilder::new().to(target).cond(guard)
}
