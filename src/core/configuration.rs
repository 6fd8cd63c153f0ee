//! The caller-owned record of which states are active.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Active atomic states plus recorded history.
///
/// A configuration is an immutable value: the interpreter never changes one
/// in place, it returns a new configuration from every transition. Callers
/// persist it between calls.
///
/// Leaves are stored by their full state id (for example
/// `"editor.edit.empty"`), which keeps a serialized configuration readable
/// and independent of how the definition is laid out in memory.
///
/// Two configurations are equal when their active leaf sets are equal;
/// recorded history does not take part in equality.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    leaves: BTreeSet<String>,
    #[serde(default)]
    history: BTreeMap<String, BTreeSet<String>>,
}

impl Configuration {
    /// A configuration with the given active leaf ids and no history.
    pub fn new<I, S>(leaves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            leaves: leaves.into_iter().map(Into::into).collect(),
            history: BTreeMap::new(),
        }
    }

    /// Replace the recorded history, returning a new configuration.
    pub fn with_history(mut self, history: BTreeMap<String, BTreeSet<String>>) -> Self {
        self.history = history;
        self
    }

    /// Active leaf ids, in id order.
    pub fn leaves(&self) -> impl Iterator<Item = &str> {
        self.leaves.iter().map(String::as_str)
    }

    pub fn contains_leaf(&self, id: &str) -> bool {
        self.leaves.contains(id)
    }

    /// Recorded history, keyed by history state id.
    pub fn history(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.history
    }

    /// States recorded for the history state `id`, if it has been recorded.
    pub fn recorded(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.history.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.leaves == other.leaves
    }
}

impl Eq for Configuration {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_ignores_history() {
        let plain = Configuration::new(["player.audio.muted"]);
        let mut history = BTreeMap::new();
        history.insert(
            "player.audio.hist".to_string(),
            BTreeSet::from(["player.audio.muted".to_string()]),
        );
        let with_history = Configuration::new(["player.audio.muted"]).with_history(history);

        assert_eq!(plain, with_history);
        assert!(with_history.recorded("player.audio.hist").is_some());
    }

    #[test]
    fn leaf_order_does_not_matter() {
        let a = Configuration::new(["m.p.a.x", "m.p.b.y"]);
        let b = Configuration::new(["m.p.b.y", "m.p.a.x"]);
        assert_eq!(a, b);
    }

    #[test]
    fn deserializes_without_history() {
        let configuration = Configuration::new(["toggle.off"]);
        let json = serde_json::to_value(&configuration).unwrap();
        assert_eq!(json, json!({ "leaves": ["toggle.off"], "history": {} }));

        let restored: Configuration =
            serde_json::from_value(json!({ "leaves": ["toggle.off"] })).unwrap();
        assert_eq!(restored, configuration);
    }

    #[test]
    fn serializes_to_binary() {
        let configuration = Configuration::new(["toggle.on"]);
        let bytes = bincode::serialize(&configuration).unwrap();
        let restored: Configuration = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, configuration);
    }
}
