//! Core statechart value types.
//!
//! This module contains the plain data the interpreter consumes and
//! produces:
//! - Events and the actions reported for the caller to run
//! - Guard predicates and their registry
//! - Configurations (what is active) and their nested `StateValue` rendering
//! - Immutable history of macrosteps
//!
//! Everything here is immutable data or a pure function, following the
//! "pure core, imperative shell" philosophy.

mod action;
mod configuration;
mod event;
mod guard;
mod history;
mod value;

pub use action::Action;
pub use configuration::Configuration;
pub use event::{Event, DONE_STATE_PREFIX};
pub use guard::{Guard, GuardError, GuardRegistry};
pub use history::{StateHistory, TransitionRecord};
pub use value::StateValue;
