//! Declarative, serde-friendly machine description.
//!
//! This is the JSON-like document a machine is written in before it is
//! compiled:
//!
//! ```json
//! {
//!   "id": "toggle",
//!   "initial": "off",
//!   "states": {
//!     "off": { "on": { "TOGGLE": "on" } },
//!     "on":  { "on": { "TOGGLE": "off" }, "entry": "notify" }
//!   }
//! }
//! ```
//!
//! Child state order is preserved as written; it is the document order the
//! interpreter uses for parallel regions and action ordering.

use crate::core::Action;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Root of a machine description: a state with a mandatory machine id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub id: String,
    #[serde(flatten)]
    pub root: StateConfig,
}

impl MachineConfig {
    /// Parse a machine description from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a machine description from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Explicit state kind. When omitted, a state with children is compound
/// and a state without children is atomic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Atomic,
    Compound,
    Parallel,
    Final,
    History,
}

/// Depth of a history state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryType {
    #[default]
    Shallow,
    Deep,
}

/// Description of one state and, recursively, its children.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateConfig {
    /// Optional alias, addressable as `#alias` from any transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<StateType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,

    #[serde(default, skip_serializing_if = "StateMap::is_empty")]
    pub states: StateMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, TransitionList>,

    /// Transitions taken when this state reaches a final state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_done: Option<TransitionList>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub entry: Vec<ActionConfig>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exit: Vec<ActionConfig>,

    /// History depth, for `type: "history"` states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryType>,

    /// Default target of a history state that has nothing recorded yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Child states in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateMap(Vec<(String, StateConfig)>);

impl StateMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, state: StateConfig) {
        self.0.push((key.into(), state));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateConfig)> {
        self.0.iter().map(|(key, state)| (key.as_str(), state))
    }

    pub fn get(&self, key: &str) -> Option<&StateConfig> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, StateConfig)> for StateMap {
    fn from_iter<I: IntoIterator<Item = (String, StateConfig)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for StateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, state) in &self.0 {
            map.serialize_entry(key, state)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StateMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StateMapVisitor;

        impl<'de> Visitor<'de> for StateMapVisitor {
            type Value = StateMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of state names to state descriptions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StateMap, A::Error> {
                let mut states = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, state)) = access.next_entry::<String, StateConfig>()? {
                    states.push((key, state));
                }
                Ok(StateMap(states))
            }
        }

        deserializer.deserialize_map(StateMapVisitor)
    }
}

/// Candidate transitions for one event, in declaration order.
///
/// Written either as a single transition or as a list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionList(#[serde(deserialize_with = "one_or_many")] pub Vec<TransitionConfig>);

impl TransitionList {
    pub fn iter(&self) -> impl Iterator<Item = &TransitionConfig> {
        self.0.iter()
    }
}

impl From<TransitionConfig> for TransitionList {
    fn from(transition: TransitionConfig) -> Self {
        Self(vec![transition])
    }
}

impl From<Vec<TransitionConfig>> for TransitionList {
    fn from(transitions: Vec<TransitionConfig>) -> Self {
        Self(transitions)
    }
}

/// One candidate transition: a bare target or a full description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransitionConfig {
    Target(String),
    Detailed(TransitionSpec),
}

impl TransitionConfig {
    /// Normalise to the detailed form.
    pub fn to_spec(&self) -> TransitionSpec {
        match self {
            TransitionConfig::Target(target) => TransitionSpec {
                target: vec![target.clone()],
                ..TransitionSpec::default()
            },
            TransitionConfig::Detailed(spec) => spec.clone(),
        }
    }
}

impl From<&str> for TransitionConfig {
    fn from(target: &str) -> Self {
        TransitionConfig::Target(target.to_string())
    }
}

/// Full transition description.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionSpec {
    /// Zero targets makes the transition targetless: actions only, no state change.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub target: Vec<String>,

    /// Name of the guard that must pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,

    /// State that must be active for the transition to be enabled.
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_state: Option<String>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub actions: Vec<ActionConfig>,

    /// Internal transitions do not exit and re-enter their source state.
    #[serde(default, skip_serializing_if = "is_false")]
    pub internal: bool,
}

/// An action written as a bare type name or as `{ "type": ..., "params": ... }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionConfig {
    Named(String),
    Detailed(Action),
}

impl ActionConfig {
    pub fn to_action(&self) -> Action {
        match self {
            ActionConfig::Named(kind) => Action::new(kind.as_str()),
            ActionConfig::Detailed(action) => action.clone(),
        }
    }
}

impl From<&str> for ActionConfig {
    fn from(kind: &str) -> Self {
        ActionConfig::Named(kind.to_string())
    }
}

impl From<Action> for ActionConfig {
    fn from(action: Action) -> Self {
        ActionConfig::Detailed(action)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}
