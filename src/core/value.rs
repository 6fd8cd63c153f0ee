//! Nested, human-readable rendering of an active configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The active states of a machine, relative to its root.
///
/// - `"off"`: the root's active child is the atomic state `off`
/// - `{"edit": "empty"}`: the root is in `edit`, which is in `empty`
/// - `{"player": {"audio": "muted", "video": "playing"}}`: parallel regions
///
/// Atomic regions of a parallel state render as an empty object.
///
/// # Example
///
/// ```rust
/// use statecraft::core::StateValue;
///
/// let value = StateValue::from("edit.empty");
/// assert_eq!(value.to_string(), "edit.empty");
/// assert!(value.matches("edit"));
/// assert!(!value.matches("filled"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Leaf(String),
    Nested(BTreeMap<String, StateValue>),
}

#[derive(Default)]
struct PathTree(BTreeMap<String, PathTree>);

impl PathTree {
    fn insert<'a>(&mut self, mut segments: impl Iterator<Item = &'a str>) {
        if let Some(head) = segments.next() {
            self.0.entry(head.to_string()).or_default().insert(segments);
        }
    }

    fn into_value(self) -> StateValue {
        if self.0.len() == 1 {
            let only_leaf = self.0.values().all(|sub| sub.0.is_empty());
            if only_leaf {
                if let Some(key) = self.0.into_keys().next() {
                    return StateValue::Leaf(key);
                }
                return StateValue::empty();
            }
        }
        StateValue::Nested(
            self.0
                .into_iter()
                .map(|(key, sub)| (key, sub.into_value()))
                .collect(),
        )
    }
}

impl StateValue {
    /// The value of an atomic region: no active children.
    pub fn empty() -> Self {
        StateValue::Nested(BTreeMap::new())
    }

    /// Build a value from dotted paths such as `"player.audio.muted"`.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tree = PathTree::default();
        for path in paths {
            tree.insert(path.split('.').filter(|segment| !segment.is_empty()));
        }
        tree.into_value()
    }

    /// Dotted paths from the root to every active leaf, in key order.
    pub fn paths(&self) -> Vec<String> {
        match self {
            StateValue::Leaf(key) => vec![key.clone()],
            StateValue::Nested(children) => children
                .iter()
                .flat_map(|(key, child)| {
                    let nested = child.paths();
                    if nested.is_empty() {
                        vec![key.clone()]
                    } else {
                        nested
                            .into_iter()
                            .map(|path| format!("{key}.{path}"))
                            .collect()
                    }
                })
                .collect(),
        }
    }

    /// Whether the dotted `path` names an active state (or one of its ancestors).
    pub fn matches(&self, path: &str) -> bool {
        let wanted: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if wanted.is_empty() {
            return false;
        }
        self.paths().iter().any(|active| {
            let segments: Vec<&str> = active.split('.').collect();
            segments.len() >= wanted.len() && segments[..wanted.len()] == wanted[..]
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StateValue::Nested(children) if children.is_empty())
    }
}

impl From<&str> for StateValue {
    fn from(path: &str) -> Self {
        StateValue::from_paths([path])
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.paths().join(", "))
    }
}
