//! Builder for constructing state descriptions.

use crate::builder::error::BuildError;
use crate::builder::transition::{action_config, TransitionBuilder};
use crate::core::Action;
use crate::definition::{
    ActionConfig, HistoryType, StateConfig, StateMap, StateType, TransitionConfig, TransitionList,
};
use std::collections::{BTreeMap, BTreeSet};

/// Builder for one state and its children.
#[derive(Clone, Debug, Default)]
pub struct StateBuilder {
    alias: Option<String>,
    kind: Option<StateType>,
    initial: Option<String>,
    states: Vec<(String, StateBuilder)>,
    on: Vec<(String, TransitionBuilder)>,
    on_done: Vec<TransitionBuilder>,
    entry: Vec<ActionConfig>,
    exit: Vec<ActionConfig>,
    history: Option<HistoryType>,
    target: Option<String>,
}

impl StateBuilder {
    /// A state whose kind follows from its children.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atomic() -> Self {
        Self::new().kind(StateType::Atomic)
    }

    pub fn compound(initial: impl Into<String>) -> Self {
        Self::new().kind(StateType::Compound).initial(initial)
    }

    pub fn parallel() -> Self {
        Self::new().kind(StateType::Parallel)
    }

    pub fn final_state() -> Self {
        Self::new().kind(StateType::Final)
    }

    pub fn history(depth: HistoryType) -> Self {
        let mut builder = Self::new().kind(StateType::History);
        builder.history = Some(depth);
        builder
    }

    pub(crate) fn kind(mut self, kind: StateType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Alias addressable as `#alias`.
    pub fn id(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn initial(mut self, key: impl Into<String>) -> Self {
        self.initial = Some(key.into());
        self
    }

    /// Add a child state. Children keep the order they are added in.
    pub fn state(mut self, key: impl Into<String>, state: StateBuilder) -> Self {
        self.states.push((key.into(), state));
        self
    }

    /// Add a candidate transition for `event`, after any already added.
    pub fn on(mut self, event: impl Into<String>, transition: impl Into<TransitionBuilder>) -> Self {
        self.on.push((event.into(), transition.into()));
        self
    }

    /// Add a transition taken when this state completes.
    pub fn on_done(mut self, transition: impl Into<TransitionBuilder>) -> Self {
        self.on_done.push(transition.into());
        self
    }

    pub fn entry(mut self, action: impl Into<Action>) -> Self {
        self.entry.push(action_config(action.into()));
        self
    }

    pub fn exit(mut self, action: impl Into<Action>) -> Self {
        self.exit.push(action_config(action.into()));
        self
    }

    /// Default target of a history state.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Build the description of this state, named `path` in errors.
    pub fn build(self, path: &str) -> Result<StateConfig, BuildError> {
        let needs_initial = !self.states.is_empty()
            && self.initial.is_none()
            && !matches!(self.kind, Some(StateType::Parallel));
        if needs_initial {
            return Err(BuildError::MissingInitialState {
                state: path.to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut states = StateMap::new();
        for (key, child) in self.states {
            if !seen.insert(key.clone()) {
                return Err(BuildError::DuplicateState {
                    parent: path.to_string(),
                    key,
                });
            }
            let child_path = format!("{path}.{key}");
            states.push(key, child.build(&child_path)?);
        }

        let mut on: BTreeMap<String, TransitionList> = BTreeMap::new();
        for (event, transition) in self.on {
            let transition = build_transition(&event, transition)?;
            on.entry(event).or_default().0.push(transition);
        }

        let on_done = if self.on_done.is_empty() {
            None
        } else {
            let event = format!("done.state.{path}");
            let transitions = self
                .on_done
                .into_iter()
                .map(|transition| build_transition(&event, transition))
                .collect::<Result<Vec<_>, _>>()?;
            Some(TransitionList(transitions))
        };

        Ok(StateConfig {
            id: self.alias,
            kind: self.kind,
            initial: self.initial,
            states,
            on,
            on_done,
            entry: self.entry,
            exit: self.exit,
            history: self.history,
            target: self.target,
        })
    }
}

fn build_transition(
    event: &str,
    transition: TransitionBuilder,
) -> Result<TransitionConfig, BuildError> {
    if transition.is_internal() && !transition.has_targets() {
        return Err(BuildError::MissingTarget {
            event: event.to_string(),
        });
    }
    Ok(transition.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_nested_states_in_order() {
        let edit = StateBuilder::compound("empty")
            .state("empty", StateBuilder::new().on("TYPE", "filled"))
            .state("filled", StateBuilder::new().on("CLEAR", "empty"))
            .entry("focus");

        let config = edit.build("editor.edit").unwrap();
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "type": "compound",
                "initial": "empty",
                "states": {
                    "empty": { "on": { "TYPE": ["filled"] } },
                    "filled": { "on": { "CLEAR": ["empty"] } }
                },
                "entry": ["focus"]
            })
        );
        let keys: Vec<&str> = config.states.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["empty", "filled"]);
    }

    #[test]
    fn candidates_for_one_event_keep_their_order() {
        let config = StateBuilder::new()
            .on("GO", TransitionBuilder::new().to("b").cond("ready"))
            .on("GO", "c")
            .build("m.a")
            .unwrap();

        let candidates: Vec<_> = config.on["GO"].iter().map(|t| t.to_spec()).collect();
        assert_eq!(candidates[0].cond.as_deref(), Some("ready"));
        assert_eq!(candidates[1].target, vec!["c".to_string()]);
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = StateBuilder::new().state("a", StateBuilder::new()).build("m.x");
        assert!(matches!(result, Err(BuildError::MissingInitialState { state }) if state == "m.x"));

        let result = StateBuilder::compound("a")
            .state("a", StateBuilder::new())
            .state("a", StateBuilder::new())
            .build("m.x");
        assert!(matches!(result, Err(BuildError::DuplicateState { key, .. }) if key == "a"));

        let result = StateBuilder::new()
            .on("PING", TransitionBuilder::new().internal())
            .build("m.x");
        assert!(matches!(result, Err(BuildError::MissingTarget { event }) if event == "PING"));
    }

    #[test]
    fn parallel_states_need_no_initial() {
        let config = StateBuilder::parallel()
            .state("a", StateBuilder::new())
            .state("b", StateBuilder::new())
            .build("m.p");
        assert!(config.is_ok());
    }
}
