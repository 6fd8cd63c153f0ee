//! Statecraft: a pure statechart interpreter
//!
//! Statecraft follows Stillwater's "pure core, imperative shell" philosophy.
//! A machine description is compiled once into an immutable definition;
//! every interpreter call then takes a configuration (which states are
//! active), a context, and an event, and returns a new configuration plus
//! the ordered list of actions the caller should run. Nothing is mutated
//! and nothing is executed by the core.
//!
//! # Core Concepts
//!
//! - **Definitions**: hierarchical, parallel, final, and history states,
//!   described as serde data or with the [`builder`] API
//! - **Configurations**: the active atomic states plus recorded history,
//!   owned and persisted by the caller
//! - **Guards**: pure predicates over context and event, registered by name
//! - **Actions**: reported as data, in exit, transition, entry order
//! - **Services**: an optional shell that runs actions as Stillwater effects
//!   and checkpoints its state
//!
//! # Example
//!
//! ```rust
//! use statecraft::core::GuardRegistry;
//! use statecraft::definition::MachineConfig;
//! use statecraft::engine::{self, Outcome};
//! use serde_json::json;
//!
//! let config = MachineConfig::from_value(json!({
//!     "id": "editor",
//!     "initial": "edit",
//!     "states": {
//!         "edit": {
//!             "initial": "empty",
//!             "on": { "SAVE": "saved" },
//!             "states": {
//!                 "empty": { "on": { "TYPE": "filled" } },
//!                 "filled": { "on": { "CLEAR": "empty" } }
//!             }
//!         },
//!         "saved": { "type": "final" }
//!     }
//! }))
//! .unwrap();
//! let machine = engine::compile(&config, GuardRegistry::<()>::new()).unwrap();
//!
//! let start = engine::initial_state(&machine, &()).unwrap();
//! assert!(start.value.matches("edit.empty"));
//!
//! let typed = engine::send(&machine, &start.configuration, &(), "TYPE").unwrap();
//! let typed = typed.into_result().unwrap();
//! assert!(typed.value.matches("edit.filled"));
//!
//! let saved = engine::send(&machine, &typed.configuration, &(), "SAVE").unwrap();
//! assert!(saved.result().unwrap().done);
//!
//! let ignored = engine::send(&machine, &start.configuration, &(), "CLEAR").unwrap();
//! assert_eq!(ignored, Outcome::Unchanged);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod definition;
pub mod effects;
pub mod engine;

// Re-export commonly used types
pub use builder::{MachineBuilder, StateBuilder, TransitionBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{Action, Configuration, Event, Guard, GuardError, GuardRegistry, StateValue};
pub use definition::{CompileError, MachineConfig, MachineDefinition, MachineHandle};
pub use effects::{Service, StepResult};
pub use engine::{InterpreterError, InterpreterOptions, InterpreterResult, Outcome};
