//! The statechart interpreter.
//!
//! - `resolver`: which transitions an event enables (innermost wins)
//! - `microstep`: which states are exited and entered
//! - `collector`: the order actions are reported in
//! - [`interpreter`]: the public entry points composing the above

mod active;
mod collector;
pub mod error;
pub mod interpreter;
mod microstep;
pub mod options;
mod resolver;

pub use error::{ConfigurationError, InterpreterError};
pub use interpreter::{
    compile, configuration_from_value, initial_state, is_done, matches, next_events, send,
    state_value, transition, InterpreterResult, Outcome,
};
pub use options::{InterpreterOptions, DEFAULT_MAX_MICROSTEPS};
