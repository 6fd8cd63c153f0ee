//! Builder for constructing transition descriptions.

use crate::core::Action;
use crate::definition::{ActionConfig, TransitionConfig, TransitionSpec};

/// Builder for a single candidate transition.
///
/// A transition with no target is targetless: it only runs its actions.
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    targets: Vec<String>,
    cond: Option<String>,
    in_state: Option<String>,
    actions: Vec<ActionConfig>,
    internal: bool,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target (`"sibling"`, `".child"`, or `"#id"`).
    ///
    /// Call more than once to enter several parallel regions.
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Require the named guard to pass.
    pub fn cond(mut self, guard: impl Into<String>) -> Self {
        self.cond = Some(guard.into());
        self
    }

    /// Require a state (`"#id"` or a path from the root) to be active.
    pub fn in_state(mut self, state: impl Into<String>) -> Self {
        self.in_state = Some(state.into());
        self
    }

    pub fn action(mut self, action: impl Into<Action>) -> Self {
        self.actions.push(action_config(action.into()));
        self
    }

    /// Do not exit and re-enter the source state.
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub(crate) fn is_internal(&self) -> bool {
        self.internal
    }

    pub(crate) fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Build the transition description, using the short form when possible.
    pub fn build(self) -> TransitionConfig {
        let plain = self.cond.is_none()
            && self.in_state.is_none()
            && self.actions.is_empty()
            && !self.internal
            && self.targets.len() == 1;

        if plain {
            if let Some(target) = self.targets.into_iter().next() {
                return TransitionConfig::Target(target);
            }
            return TransitionConfig::Detailed(TransitionSpec::default());
        }

        TransitionConfig::Detailed(TransitionSpec {
            target: self.targets,
            cond: self.cond,
            in_state: self.in_state,
            actions: self.actions,
            internal: self.internal,
        })
    }
}

/// Actions without params are written by name alone.
pub(crate) fn action_config(action: Action) -> ActionConfig {
    match action.params() {
        Some(_) => ActionConfig::Detailed(action),
        None => ActionConfig::Named(action.kind().to_string()),
    }
}

impl From<&str> for TransitionBuilder {
    fn from(target: &str) -> Self {
        TransitionBuilder::new().to(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_target_uses_short_form() {
        let transition = TransitionBuilder::new().to("on").build();
        assert_eq!(transition, TransitionConfig::Target("on".to_string()));
        assert_eq!(serde_json::to_value(&transition).unwrap(), json!("on"));
    }

    #[test]
    fn fluent_api_builds_detailed_transition() {
        let transition = TransitionBuilder::new()
            .to("submitted")
            .cond("isValid")
            .in_state("#online")
            .action("submit")
            .action(Action::new("track").with_params(json!({ "step": 2 })))
            .build();

        assert_eq!(
            serde_json::to_value(&transition).unwrap(),
            json!({
                "target": ["submitted"],
                "cond": "isValid",
                "in": "#online",
                "actions": ["submit", { "type": "track", "params": { "step": 2 } }]
            })
        );
    }

    #[test]
    fn targetless_transition_keeps_actions() {
        let spec = TransitionBuilder::new().action("log").build().to_spec();
        assert!(spec.target.is_empty());
        assert_eq!(spec.actions.len(), 1);
    }
}
