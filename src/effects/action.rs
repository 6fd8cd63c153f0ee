//! Executors that carry out reported actions.

use crate::core::{Action, Event};
use crate::engine::InterpreterError;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;

/// Errors raised while executing an action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action '{action}' failed: {reason}")]
    Failed { action: String, reason: String },

    #[error("Action '{action}' rejected its params: {reason}")]
    InvalidParams { action: String, reason: String },
}

impl ActionError {
    pub fn failed(action: &Action, reason: impl Into<String>) -> Self {
        ActionError::Failed {
            action: action.kind().to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_params(action: &Action, reason: impl Into<String>) -> Self {
        ActionError::InvalidParams {
            action: action.kind().to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a [`Service`](super::Service) step.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Executes one action type.
///
/// An executor receives the action, the context as left by the previous
/// action, and the event being handled, and returns an effect producing the
/// updated context. A fresh effect is created on each invocation.
pub type ActionExecutor<C, Env> =
    Arc<dyn Fn(Action, C, Event) -> BoxedEffect<C, ActionError, Env> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn errors_name_the_action() {
        let action = Action::new("charge").with_params(json!({ "amount": -1 }));
        assert_eq!(
            ActionError::failed(&action, "card declined").to_string(),
            "Action 'charge' failed: card declined"
        );
        assert_eq!(
            ActionError::invalid_params(&action, "negative amount").to_string(),
            "Action 'charge' rejected its params: negative amount"
        );
    }

    #[test]
    fn service_error_is_transparent() {
        let error = ServiceError::from(InterpreterError::MicrostepLimit { limit: 4 });
        assert_eq!(
            error.to_string(),
            "Exceeded 4 microsteps while processing internal events"
        );
    }
}
