//! Action descriptors reported by the interpreter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An opaque, named instruction for the caller to execute.
///
/// The interpreter never runs actions. It only reports them, in a
/// deterministic order, as part of each transition result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// The action's type name, used by callers to dispatch it.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }
}

impl From<&str> for Action {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)
    }
}
