//! Effectful execution of a machine using Stillwater 0.11.0.
//!
//! The interpreter is the pure core: it decides what happens and reports
//! actions as data. This module is the imperative shell that runs those
//! actions with side effects, I/O, and external calls.
//!
//! # Key Concepts
//!
//! - **Executors**: one effect factory per action type
//! - **Service**: owns configuration and context, runs a step's actions in order
//! - **Effects**: uses Stillwater's zero-cost effect system
//!
//! Following Stillwater 0.11.0 conventions, executors return `BoxedEffect`
//! (one allocation per action) and build it from free-standing constructors:
//! `pure()`, `fail()`, `from_fn()`.

mod action;
mod service;

pub use action::{ActionError, ActionExecutor, ServiceError};
pub use service::{Service, StepResult};
