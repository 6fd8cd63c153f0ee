//! Ordered collection of the actions produced by a call.

use crate::core::Action;
use crate::definition::{StateNode, Transition};
use tracing::trace;

/// Accumulates actions in reporting order.
///
/// Within a microstep the engine exits states innermost first, then runs
/// transition actions in selection order, then enters states outermost
/// first; the collector simply records what it is handed in that order, and
/// successive microsteps append to the same list.
#[derive(Debug, Default)]
pub(crate) struct ActionCollector {
    actions: Vec<Action>,
}

impl ActionCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn exit(&mut self, state: &StateNode) {
        if !state.exit().is_empty() {
            trace!(state = state.id(), count = state.exit().len(), "Collecting exit actions");
        }
        self.actions.extend_from_slice(state.exit());
    }

    pub(crate) fn transition(&mut self, transition: &Transition) {
        self.actions.extend_from_slice(transition.actions());
    }

    pub(crate) fn entry(&mut self, state: &StateNode) {
        if !state.entry().is_empty() {
            trace!(state = state.id(), count = state.entry().len(), "Collecting entry actions");
        }
        self.actions.extend_from_slice(state.entry());
    }

    pub(crate) fn into_actions(self) -> Vec<Action> {
        self.actions
    }
}
