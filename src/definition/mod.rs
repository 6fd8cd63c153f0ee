//! Machine descriptions and their compiled form.
//!
//! A [`MachineConfig`] is the declarative, serde-friendly description of a
//! statechart. Compiling it against a [`GuardRegistry`](crate::core::GuardRegistry)
//! produces a [`MachineDefinition`]: an immutable arena of [`StateNode`]s with
//! every target, guard, and `in` condition already resolved.

mod compile;
pub mod config;
pub mod error;
pub mod machine;
pub mod node;

pub use config::{
    ActionConfig, HistoryType, MachineConfig, StateConfig, StateMap, StateType, TransitionConfig,
    TransitionList, TransitionSpec,
};
pub use error::{CompileError, DefinitionError};
pub use machine::{Ancestors, MachineDefinition, MachineHandle};
pub use node::{HistoryKind, NodeId, StateKind, StateNode, Transition};
